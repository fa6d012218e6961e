//! Audio response decoder
//!
//! Turns the `response` payload of `audio.get` / `audio.search` into
//! [`AudioTrack`]s. The API is loose about types: numbers arrive as strings,
//! fields go missing, and older versions prepend the total count to the list.
//! Decoding never fails; anything unusable falls back to the field default.

use core_library::AudioTrack;
use serde_json::{Map, Value};
use url::Url;

/// Longest entity (including `&` and `;`) tried when unescaping piecewise.
const MAX_ENTITY_LEN: usize = 10;

/// Decode a list of audio records.
///
/// Accepts a plain array, optionally led by a bare count, or a
/// `{"count": N, "items": [...]}` object. Anything else yields an empty list.
pub fn decode_audio_list(response: &Value) -> Vec<AudioTrack> {
    let items = match response {
        Value::Array(items) => items.as_slice(),
        Value::Object(map) => match map.get("items") {
            Some(Value::Array(items)) => items.as_slice(),
            _ => return Vec::new(),
        },
        _ => return Vec::new(),
    };

    let records = match items.split_first() {
        Some((first, rest)) if is_count_marker(first) => rest,
        _ => items,
    };

    records.iter().map(decode_audio).collect()
}

/// Decode a single audio record. Non-object values give a default track.
pub fn decode_audio(value: &Value) -> AudioTrack {
    let Some(record) = value.as_object() else {
        return AudioTrack::default();
    };

    AudioTrack {
        id: int_field(record, &["aid", "id"]),
        owner_id: int_field(record, &["owner_id"]),
        artist: text_field(record, "artist"),
        title: text_field(record, "title"),
        duration: float_field(record, "duration"),
        album_id: int_field(record, &["album", "album_id"]),
        lyrics_id: int_field(record, &["lyrics_id"]),
        url: record
            .get("url")
            .and_then(Value::as_str)
            .map(str::trim)
            .filter(|raw| !raw.is_empty())
            .and_then(|raw| Url::parse(raw).ok()),
    }
}

fn is_count_marker(value: &Value) -> bool {
    match value {
        Value::Number(_) => true,
        Value::String(text) => text.trim().parse::<i64>().is_ok(),
        _ => false,
    }
}

fn as_i64(value: &Value) -> Option<i64> {
    match value {
        Value::Number(number) => number
            .as_i64()
            .or_else(|| number.as_f64().map(|f| f.trunc() as i64)),
        Value::String(text) => {
            let text = text.trim();
            text.parse::<i64>()
                .ok()
                .or_else(|| text.parse::<f64>().ok().map(|f| f.trunc() as i64))
        }
        _ => None,
    }
}

fn as_f64(value: &Value) -> Option<f64> {
    match value {
        Value::Number(number) => number.as_f64(),
        Value::String(text) => text.trim().parse::<f64>().ok(),
        _ => None,
    }
}

/// First of `keys` holding a usable integer, else 0.
fn int_field(record: &Map<String, Value>, keys: &[&str]) -> i64 {
    keys.iter()
        .filter_map(|key| record.get(*key))
        .find_map(as_i64)
        .unwrap_or(0)
}

fn float_field(record: &Map<String, Value>, key: &str) -> f64 {
    record.get(key).and_then(as_f64).unwrap_or(0.0)
}

fn text_field(record: &Map<String, Value>, key: &str) -> String {
    match record.get(key) {
        Some(Value::String(text)) => unescape_html(text),
        Some(Value::Number(number)) => number.to_string(),
        _ => String::new(),
    }
}

/// Decode HTML entities (`&amp;`, `&quot;`, `&#39;`, ...).
///
/// Text with a stray `&` is decoded entity by entity; anything that is not a
/// valid entity is kept verbatim.
pub fn unescape_html(raw: &str) -> String {
    if !raw.contains('&') {
        return raw.to_string();
    }

    htmlescape::decode_html(raw).unwrap_or_else(|_| unescape_entities_lossy(raw))
}

fn unescape_entities_lossy(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    let mut rest = raw;

    while let Some(start) = rest.find('&') {
        out.push_str(&rest[..start]);
        let candidate = &rest[start..];

        let entity = candidate
            .find(';')
            .filter(|end| *end < MAX_ENTITY_LEN)
            .and_then(|end| {
                htmlescape::decode_html(&candidate[..=end])
                    .ok()
                    .map(|text| (text, end))
            });

        match entity {
            Some((text, end)) => {
                out.push_str(&text);
                rest = &candidate[end + 1..];
            }
            None => {
                out.push('&');
                rest = &candidate[1..];
            }
        }
    }

    out.push_str(rest);
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_drops_leading_count() {
        let response = json!([
            3,
            {
                "aid": 1,
                "owner_id": 10,
                "artist": "A &amp; B",
                "title": "T",
                "duration": 120,
                "url": "http://x/y.mp3"
            }
        ]);

        let tracks = decode_audio_list(&response);

        assert_eq!(tracks.len(), 1);
        let track = &tracks[0];
        assert_eq!(track.id, 1);
        assert_eq!(track.owner_id, 10);
        assert_eq!(track.artist, "A & B");
        assert_eq!(track.title, "T");
        assert_eq!(track.duration, 120.0);
        assert_eq!(track.url.as_ref().map(Url::as_str), Some("http://x/y.mp3"));
    }

    #[test]
    fn test_keeps_leading_record() {
        let response = json!([{"aid": 1}, {"aid": 2}]);

        let ids: Vec<i64> = decode_audio_list(&response).iter().map(|t| t.id).collect();
        assert_eq!(ids, vec![1, 2]);
    }

    #[test]
    fn test_string_count_is_dropped() {
        let response = json!(["2", {"aid": 7}]);
        let tracks = decode_audio_list(&response);

        assert_eq!(tracks.len(), 1);
        assert_eq!(tracks[0].id, 7);
    }

    #[test]
    fn test_only_first_number_is_dropped() {
        let response = json!([1, 2, {"aid": 3}]);
        let tracks = decode_audio_list(&response);

        assert_eq!(tracks.len(), 2);
        assert_eq!(tracks[0], AudioTrack::default());
        assert_eq!(tracks[1].id, 3);
    }

    #[test]
    fn test_missing_fields_default() {
        let tracks = decode_audio_list(&json!([{}]));

        assert_eq!(tracks, vec![AudioTrack::default()]);
        assert_eq!(tracks[0].artist, "");
        assert_eq!(tracks[0].duration, 0.0);
    }

    #[test]
    fn test_items_envelope() {
        let response = json!({
            "count": 2,
            "items": [
                {"id": 5, "owner_id": -55, "album_id": 3, "lyrics_id": "9"},
                {"id": 6, "owner_id": -55}
            ]
        });

        let tracks = decode_audio_list(&response);

        assert_eq!(tracks.len(), 2);
        assert_eq!(tracks[0].id, 5);
        assert_eq!(tracks[0].owner_id, -55);
        assert_eq!(tracks[0].album_id, 3);
        assert_eq!(tracks[0].lyrics_id, 9);
    }

    #[test]
    fn test_non_list_input_is_empty() {
        assert!(decode_audio_list(&json!(null)).is_empty());
        assert!(decode_audio_list(&json!(42)).is_empty());
        assert!(decode_audio_list(&json!({"count": 0})).is_empty());
        assert!(decode_audio_list(&json!([])).is_empty());
        assert!(decode_audio_list(&json!([0])).is_empty());
    }

    #[test]
    fn test_lenient_numbers() {
        let track = decode_audio(&json!({
            "aid": "12",
            "owner_id": 10.9,
            "duration": "95.5",
            "album": "not a number",
            "album_id": 4
        }));

        assert_eq!(track.id, 12);
        assert_eq!(track.owner_id, 10);
        assert_eq!(track.duration, 95.5);
        assert_eq!(track.album_id, 4);
    }

    #[test]
    fn test_aid_takes_precedence_over_id() {
        let track = decode_audio(&json!({"aid": 1, "id": 2}));
        assert_eq!(track.id, 1);
    }

    #[test]
    fn test_bad_url_is_none() {
        assert!(decode_audio(&json!({"url": ""})).url.is_none());
        assert!(decode_audio(&json!({"url": "not a url"})).url.is_none());
        assert!(decode_audio(&json!({"url": 5})).url.is_none());
    }

    #[test]
    fn test_non_object_element_is_default() {
        let tracks = decode_audio_list(&json!([{"aid": 1}, "junk", null]));
        assert_eq!(tracks.len(), 3);
        assert_eq!(tracks[1], AudioTrack::default());
    }

    #[test]
    fn test_unescape_html() {
        assert_eq!(unescape_html("A &amp; B"), "A & B");
        assert_eq!(unescape_html("&quot;Hi&quot; &#39;there&#39;"), "\"Hi\" 'there'");
        assert_eq!(unescape_html("plain"), "plain");
    }

    #[test]
    fn test_unescape_keeps_stray_ampersand() {
        assert_eq!(unescape_html("Rock & Roll &amp; Blues"), "Rock & Roll & Blues");
        assert_eq!(unescape_html("AT&T"), "AT&T");
        assert_eq!(unescape_html("&bogus;"), "&bogus;");
    }

    #[test]
    fn test_decoding_is_repeatable() {
        let response = json!([1, {"aid": 1, "title": "x &lt; y"}]);
        assert_eq!(decode_audio_list(&response), decode_audio_list(&response));
        assert_eq!(decode_audio_list(&response)[0].title, "x < y");
    }
}
