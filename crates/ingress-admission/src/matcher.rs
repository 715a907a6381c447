/// Prefix identifying a single-level wildcard pattern
const WILDCARD_PREFIX: &str = "*.";

/// Checks whether `hostname` is covered by one of the `whitelist` patterns.
///
/// A pattern is either an exact hostname, or a wildcard like
/// `*.namespace.svc.cluster.local`. A wildcard covers exactly one label:
/// `*.example.com` matches `site.example.com` but not `a.site.example.com`.
/// Patterns are tried in order, the first match wins. A wildcard with a
/// different number of labels than the hostname rejects the hostname
/// straight away, the remaining patterns are not looked at.
pub fn matches<S: AsRef<str>>(hostname: &str, whitelist: &[S]) -> bool {
    for pattern in whitelist {
        let pattern = pattern.as_ref();
        if !pattern.starts_with(WILDCARD_PREFIX) {
            if hostname == pattern {
                return true;
            }
            continue;
        }

        // the wildcard stands for a single label, deeper hostnames are not covered
        if labels(pattern) != labels(hostname) {
            return false;
        }

        // keep the leading dot, `*.example.com` must not match `badexample.com`
        if hostname.ends_with(&pattern[1..]) {
            return true;
        }
    }

    false
}

fn labels(name: &str) -> usize {
    name.split('.').count()
}
