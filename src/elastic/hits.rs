use tracing::warn;

use super::types::{Hit, Passage, RawHit, SearchResponse};

/// Converts the engine's ranked records into hits, preserving engine order.
pub fn extract_hits(response: &SearchResponse) -> Vec<Hit> {
    raw_hits(response).iter().map(to_hit).collect()
}

/// Top record's body and url, or `None` when nothing usable matched.
pub fn extract_passage(response: &SearchResponse) -> Option<Passage> {
    let top = raw_hits(response).first().map(to_hit)?;

    let Some(body) = top.body_content.filter(|b| !b.trim().is_empty()) else {
        warn!("top hit has no body_content; treating as no grounding passage");
        return None;
    };

    Some(Passage { body, url: top.url })
}

fn raw_hits(response: &SearchResponse) -> &[RawHit] {
    response
        .hits
        .as_ref()
        .map(|h| h.hits.as_slice())
        .unwrap_or_default()
}

fn to_hit(raw: &RawHit) -> Hit {
    Hit {
        title: field_text(raw, "title").unwrap_or_default(),
        url: field_text(raw, "url").unwrap_or_default(),
        score: raw.score.unwrap_or(0.0),
        body_content: field_text(raw, "body_content"),
    }
}

/// Multi-valued fields are joined with a single space.
fn field_text(raw: &RawHit, name: &str) -> Option<String> {
    let values = raw.fields.get(name)?;
    let parts: Vec<String> = values
        .iter()
        .map(|v| match v {
            serde_json::Value::String(s) => s.clone(),
            other => other.to_string(),
        })
        .collect();
    if parts.is_empty() {
        None
    } else {
        Some(parts.join(" "))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn response(body: serde_json::Value) -> SearchResponse {
        serde_json::from_value(body).unwrap()
    }

    #[test]
    fn extracts_hits_in_engine_order() {
        let resp = response(json!({
            "hits": {"hits": [
                {"_score": 2.5, "fields": {"title": ["Second best"], "url": ["https://b"]}},
                {"_score": 7.1, "fields": {"title": ["Best"], "url": ["https://a"]}}
            ]}
        }));

        let hits = extract_hits(&resp);

        assert_eq!(hits.len(), 2);
        assert_eq!(hits[0].title, "Second best");
        assert_eq!(hits[0].score, 2.5);
        assert_eq!(hits[1].url, "https://a");
    }

    #[test]
    fn joins_multi_valued_fields() {
        let resp = response(json!({
            "hits": {"hits": [
                {"_score": 1.0, "fields": {"title": ["Refund", "Policy"], "url": ["https://x"]}}
            ]}
        }));

        assert_eq!(extract_hits(&resp)[0].title, "Refund Policy");
    }

    #[test]
    fn missing_fields_and_score_default() {
        let resp = response(json!({"hits": {"hits": [{"_score": null}]}}));

        let hit = &extract_hits(&resp)[0];
        assert_eq!(hit.title, "");
        assert_eq!(hit.url, "");
        assert_eq!(hit.score, 0.0);
        assert!(hit.body_content.is_none());
    }

    #[test]
    fn empty_response_has_no_hits_or_passage() {
        let resp = response(json!({"hits": {"hits": []}}));
        assert!(extract_hits(&resp).is_empty());
        assert!(extract_passage(&resp).is_none());

        let resp = response(json!({}));
        assert!(extract_hits(&resp).is_empty());
    }

    #[test]
    fn passage_takes_top_body_and_url() {
        let resp = response(json!({
            "hits": {"hits": [{
                "_score": 12.0,
                "fields": {
                    "body_content": ["Refunds are issued within 30 days."],
                    "url": ["https://blog/refunds"],
                    "title": ["Refunds"]
                }
            }]}
        }));

        let passage = extract_passage(&resp).unwrap();
        assert_eq!(passage.body, "Refunds are issued within 30 days.");
        assert_eq!(passage.url, "https://blog/refunds");
    }

    #[test]
    fn passage_without_body_is_not_found() {
        let resp = response(json!({
            "hits": {"hits": [{"_score": 1.0, "fields": {"url": ["https://x"]}}]}
        }));
        assert!(extract_passage(&resp).is_none());
    }
}
