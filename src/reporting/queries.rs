//! Supported reporting endpoints and their canned queries.

/// A supported reporting endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReportKind {
    /// Most recent 20 probes within the last 24 hours.
    Recent,
    /// Top 20 paths by hit count within the last 30 days.
    TopPaths,
}

impl ReportKind {
    /// Resolve a request path under `prefix`. The bare prefix is a legacy alias of `TopPaths`.
    pub fn from_path(path: &str, prefix: &str) -> Option<Self> {
        let lower = path.to_ascii_lowercase();
        let rest = lower.strip_prefix(&prefix.to_ascii_lowercase())?;
        match rest {
            "_last" => Some(Self::Recent),
            "_top" | "" => Some(Self::TopPaths),
            _ => None,
        }
    }

    /// Short label used in metrics and logs.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Recent => "last",
            Self::TopPaths => "top",
        }
    }

    /// SQL for this report against `dataset`.
    ///
    /// Blob layout: 1 path, 2 country, 3 region, 4 user agent, 5 ASN; double1 is the hit weight.
    pub fn sql(&self, dataset: &str) -> String {
        match self {
            Self::Recent => format!(
                "SELECT timestamp, blob1 AS path, blob2 AS country, blob3 AS region, \
                 blob4 AS user_agent, blob5 AS asn \
                 FROM {dataset} \
                 WHERE timestamp > NOW() - INTERVAL '1' DAY \
                 ORDER BY timestamp DESC \
                 LIMIT 20"
            ),
            Self::TopPaths => format!(
                "SELECT blob1 AS path, SUM(_sample_interval * double1) AS hits \
                 FROM {dataset} \
                 WHERE timestamp > NOW() - INTERVAL '30' DAY \
                 GROUP BY path \
                 ORDER BY hits DESC \
                 LIMIT 20"
            ),
        }
    }
}
