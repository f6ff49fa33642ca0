use itertools::Itertools;
use regex::Regex;
use shared::{links::LinkSet, track::TrackMetadata};
use std::sync::OnceLock;

fn non_alnum_runs() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new("[^a-zA-Z0-9]+").expect("static pattern"))
}

/// Spaces become `+`, then every run of non-alphanumerics (including those
/// `+`) collapses into a single `+`.
pub fn sanitize_query(value: &str) -> String {
    let spaced = value.replace(' ', "+");
    non_alnum_runs().replace_all(&spaced, "+").into_owned()
}

fn query(parts: &[&str]) -> String {
    parts.iter().map(|p| sanitize_query(p)).join("+")
}

pub fn build_links(meta: &TrackMetadata) -> LinkSet {
    let artist_track = query(&[&meta.artist, &meta.track]);
    let artist_album = query(&[&meta.artist, &meta.album]);

    LinkSet {
        video_search: format!("https://www.youtube.com/results?search_query={artist_track}"),
        image_search: format!("https://www.google.com/search?q={artist_album}&tbm=isch"),
        encyclopedia_search: format!("https://www.google.com/search?q=wikipedia+{artist_album}"),
    }
}
