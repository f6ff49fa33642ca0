use shared::{prompt::PromptSpec, track::TrackMetadata};

pub const ALBUM_INFO_TITLE: &str = "## Album info and credits";
pub const ALBUM_REVIEW_TITLE: &str = "## Album review";
pub const SONG_INFO_TITLE: &str = "## Song info";

/// The fixed set of questions asked about every track.
pub fn build_prompts(meta: &TrackMetadata) -> Vec<PromptSpec> {
    let TrackMetadata {
        artist,
        album,
        track,
    } = meta;

    vec![
        PromptSpec::new(
            ALBUM_INFO_TITLE,
            format!(
                "Give me album information and full credits (musicians, producers, \
                 engineers, release date, label) of the album {album} by {artist}"
            ),
        ),
        PromptSpec::new(
            ALBUM_REVIEW_TITLE,
            format!("Give me a critical review of the album {album} by {artist}"),
        ),
        PromptSpec::new(
            SONG_INFO_TITLE,
            format!("Give me song info (limit 500 characters) of {artist} {track}"),
        ),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    fn meta() -> TrackMetadata {
        TrackMetadata::new("Radiohead", "ok computer", "Airbag")
    }

    #[test]
    fn three_prompts_in_fixed_order() {
        let titles: Vec<_> = build_prompts(&meta()).into_iter().map(|p| p.title).collect();
        assert_eq!(titles, vec![ALBUM_INFO_TITLE, ALBUM_REVIEW_TITLE, SONG_INFO_TITLE]);
    }

    #[test]
    fn titles_are_distinct_headings() {
        let prompts = build_prompts(&meta());
        let unique: HashSet<_> = prompts.iter().map(|p| p.title.as_str()).collect();
        assert_eq!(unique.len(), prompts.len());
        assert!(prompts.iter().all(|p| p.title.starts_with("## ")));
    }

    #[test]
    fn prompts_mention_the_track() {
        let prompts = build_prompts(&meta());
        assert!(prompts[0].prompt.contains("ok computer") && prompts[0].prompt.contains("Radiohead"));
        assert!(prompts[1].prompt.contains("ok computer"));
        assert!(prompts[2].prompt.contains("Airbag") && prompts[2].prompt.contains("500 characters"));
    }

    #[test]
    fn output_is_deterministic() {
        assert_eq!(build_prompts(&meta()), build_prompts(&meta()));
    }
}
