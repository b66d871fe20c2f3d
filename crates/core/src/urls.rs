use crate::model::TrackId;
use percent_encoding::{utf8_percent_encode, NON_ALPHANUMERIC};

pub fn stream_url(base: &str, id: &TrackId) -> String {
    let encoded = utf8_percent_encode(id.as_str(), NON_ALPHANUMERIC).to_string();
    format!("{}/stream/{encoded}", base.trim_end_matches('/'))
}

pub fn cover_url(base: &str, id: &TrackId) -> String {
    let encoded = utf8_percent_encode(id.as_str(), NON_ALPHANUMERIC).to_string();
    format!("{}/cover/{encoded}.jpg", base.trim_end_matches('/'))
}
