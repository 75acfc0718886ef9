//! Tagging and forwarding of parsed batches.

use std::collections::BTreeMap;

use axum::http::HeaderMap;

use crate::metric::Metric;
use crate::sink::Sink;

/// Tag key carrying the request path when `path_tag` is enabled.
pub const PATH_TAG: &str = "http_listener_v2_path";

/// Request-derived tags applied to every metric of a batch.
pub(crate) struct RequestTags<'a> {
    pub headers: &'a HeaderMap,
    pub header_tags: &'a BTreeMap<String, String>,
    pub path: Option<&'a str>,
}

impl RequestTags<'_> {
    /// Attach header tags (present and non-empty headers only) and the path tag.
    pub fn apply(&self, metric: &mut Metric) {
        for (header, tag) in self.header_tags {
            let Some(value) = self.headers.get(header.as_str()) else {
                continue;
            };
            if value.is_empty() {
                continue;
            }
            metric.add_tag(tag.clone(), String::from_utf8_lossy(value.as_bytes()));
        }

        if let Some(path) = self.path {
            metric.add_tag(PATH_TAG, path);
        }
    }
}

/// Tag each metric and move it into the sink. Returns the number forwarded.
pub(crate) fn forward_batch(sink: &dyn Sink, tags: &RequestTags<'_>, batch: Vec<Metric>) -> usize {
    let count = batch.len();
    for mut metric in batch {
        tags.apply(&mut metric);
        sink.forward(metric);
    }
    count
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;
    use std::time::SystemTime;

    #[derive(Default)]
    struct Collect(Mutex<Vec<Metric>>);

    impl Sink for Collect {
        fn forward(&self, metric: Metric) {
            self.0.lock().unwrap().push(metric);
        }
    }

    fn header_tags() -> BTreeMap<String, String> {
        BTreeMap::from([
            ("X-Source".to_string(), "source".to_string()),
            ("X-Region".to_string(), "region".to_string()),
        ])
    }

    #[test]
    fn header_tag_only_when_present_and_non_empty() {
        let mut headers = HeaderMap::new();
        headers.insert("x-source", "edge-1".parse().unwrap());
        headers.insert("x-region", "".parse().unwrap());
        let header_tags = header_tags();
        let tags = RequestTags {
            headers: &headers,
            header_tags: &header_tags,
            path: None,
        };

        let mut metric = Metric::new("cpu", SystemTime::UNIX_EPOCH);
        tags.apply(&mut metric);

        assert_eq!(metric.tag("source"), Some("edge-1"));
        assert_eq!(metric.tag("region"), None);
        assert_eq!(metric.tag(PATH_TAG), None);
    }

    #[test]
    fn path_tag_and_forwarding() {
        let headers = HeaderMap::new();
        let header_tags = BTreeMap::new();
        let tags = RequestTags {
            headers: &headers,
            header_tags: &header_tags,
            path: Some("/write"),
        };
        let sink = Collect::default();
        let batch = vec![
            Metric::new("a", SystemTime::UNIX_EPOCH),
            Metric::new("b", SystemTime::UNIX_EPOCH),
        ];

        assert_eq!(forward_batch(&sink, &tags, batch), 2);

        let forwarded = sink.0.lock().unwrap();
        assert_eq!(forwarded.len(), 2);
        assert!(forwarded.iter().all(|m| m.tag(PATH_TAG) == Some("/write")));
        assert_eq!(forwarded[1].name(), "b");
    }
}
