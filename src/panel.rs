//! The info and action panel shown under a generated image.

use base64::Engine;
use base64::engine::general_purpose;
use url::form_urlencoded::byte_serialize;

use crate::constants::{
    DOWNLOAD_FILENAME, LANGUAGES_PER_ROW, NO_LANGUAGES_PLACEHOLDER, SHARE_INTENT_URL, SHARE_LABEL,
};
use crate::envelope::ProcessingResult;

/// Link to the GitHub profile.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ProfileTag {
    /// Profile URL
    pub url: String,
    /// `@username`
    pub label: String,
}

/// One language chip.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LanguageTag {
    /// Text on the chip
    pub name: String,
    /// CSS classes for the chip
    pub class: &'static str,
}

impl LanguageTag {
    fn named(name: &str) -> Self {
        Self {
            name: name.to_owned(),
            class: "language-tag",
        }
    }

    fn placeholder() -> Self {
        Self {
            name: NO_LANGUAGES_PLACEHOLDER.to_string(),
            class: "language-tag placeholder",
        }
    }

    /// Whether this is the "no languages" stand-in.
    pub fn is_placeholder(&self) -> bool {
        self.class.ends_with("placeholder")
    }
}

/// Client-side save of the composited image.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DownloadAction {
    /// `data:image/png;base64,...`
    pub data_uri: String,
    /// Name the file is saved under
    pub filename: &'static str,
}

/// Pre-filled social share link.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ShareAction {
    /// Share-intent URL, opened in a new tab
    pub url: String,
    /// Button text
    pub label: &'static str,
}

/// Everything shown next to the composited image.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Panel {
    /// Profile link
    pub profile: ProfileTag,
    /// Public repository count as returned by the backend
    pub repository_count: u64,
    /// `"<n> repos"`
    pub repo_label: String,
    /// Language chips, [`LANGUAGES_PER_ROW`] to a row
    pub language_rows: Vec<Vec<LanguageTag>>,
    /// Download action
    pub download: DownloadAction,
    /// Share action
    pub share: ShareAction,
}

/// Builds the panel for a finished run.
///
/// `png` is the encoded composite, `image_link` is the public location of
/// the generated image used in the share message.
pub fn build_panel(
    processed: &ProcessingResult,
    png: &[u8],
    submission: &str,
    image_link: &str,
) -> Panel {
    Panel {
        profile: profile_tag(&processed.profile_url),
        repository_count: processed.repository_count,
        repo_label: format!("{} repos", processed.repository_count),
        language_rows: language_rows(&processed.language_tags),
        download: DownloadAction {
            data_uri: png_data_uri(png),
            filename: DOWNLOAD_FILENAME,
        },
        share: ShareAction {
            url: share_intent(submission, image_link),
            label: SHARE_LABEL,
        },
    }
}

/// Labels a profile link with the last segment of its path.
pub fn profile_tag(profile_url: &str) -> ProfileTag {
    let username = profile_url
        .trim_end_matches('/')
        .rsplit('/')
        .next()
        .unwrap_or(profile_url);
    ProfileTag {
        url: profile_url.to_owned(),
        label: format!("@{username}"),
    }
}

/// Groups languages three to a row, or a single placeholder when there are none.
pub fn language_rows(languages: &[String]) -> Vec<Vec<LanguageTag>> {
    if languages.is_empty() {
        return vec![vec![LanguageTag::placeholder()]];
    }
    languages
        .chunks(LANGUAGES_PER_ROW)
        .map(|row| row.iter().map(|name| LanguageTag::named(name)).collect())
        .collect()
}

/// Encodes PNG bytes as a data URI.
pub fn png_data_uri(png: &[u8]) -> String {
    format!(
        "data:image/png;base64,{}",
        general_purpose::STANDARD.encode(png)
    )
}

/// Share-intent URL with the message and image link URL-encoded.
pub fn share_intent(submission: &str, image_link: &str) -> String {
    let text = format!(
        "Check out my CodeBeast generated for {submission} using GitHub data and Langflow!"
    );
    format!(
        "{SHARE_INTENT_URL}?text={}&url={}",
        byte_serialize(text.as_bytes()).collect::<String>(),
        byte_serialize(image_link.as_bytes()).collect::<String>()
    )
}
