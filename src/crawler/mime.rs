//! File extension selection for downloaded originals

use url::Url;

/// Extension used when neither the URL nor the MIME type gives one
pub const UNKNOWN_EXTENSION: &str = "ukw";

/// Longest extension taken from a URL path
const MAX_EXTENSION_LEN: usize = 8;

const MIME_EXTENSIONS: &[(&str, &str)] = &[
    ("text/html", "html"),
    ("application/xhtml+xml", "xhtml"),
    ("text/plain", "txt"),
    ("text/xml", "xml"),
    ("application/xml", "xml"),
    ("text/csv", "csv"),
    ("application/rtf", "rtf"),
    ("text/rtf", "rtf"),
    ("application/pdf", "pdf"),
    ("application/msword", "doc"),
    (
        "application/vnd.openxmlformats-officedocument.wordprocessingml.document",
        "docx",
    ),
    ("application/vnd.oasis.opendocument.text", "odt"),
    ("application/json", "json"),
];

/// Extracts the file extension of the last path segment
///
/// Query and fragment are not part of the path, so `page.php?id=1` yields
/// `php`. Only short alphanumeric extensions are accepted; they are
/// lowercased.
///
/// # Examples
///
/// ```
/// use kgs_crawl::crawler::mime::extension_from_path;
/// use url::Url;
///
/// let url = Url::parse("http://example.com/docs/Report.PDF?dl=1").unwrap();
/// assert_eq!(extension_from_path(&url), Some("pdf".to_string()));
///
/// let url = Url::parse("http://example.com/docs/").unwrap();
/// assert_eq!(extension_from_path(&url), None);
/// ```
pub fn extension_from_path(url: &Url) -> Option<String> {
    let segment = url.path_segments()?.last()?;
    let (stem, extension) = segment.rsplit_once('.')?;

    if stem.is_empty()
        || extension.is_empty()
        || extension.len() > MAX_EXTENSION_LEN
        || !extension.chars().all(|c| c.is_ascii_alphanumeric())
    {
        return None;
    }

    Some(extension.to_ascii_lowercase())
}

/// Maps a MIME type to a file extension, falling back to [`UNKNOWN_EXTENSION`]
pub fn extension_for_mime(mime: Option<&str>) -> String {
    let Some(mime) = mime else {
        return UNKNOWN_EXTENSION.to_string();
    };

    let essence = essence(mime);
    MIME_EXTENSIONS
        .iter()
        .find(|(known, _)| *known == essence)
        .map(|(_, extension)| extension.to_string())
        .unwrap_or_else(|| UNKNOWN_EXTENSION.to_string())
}

/// Chooses the extension of a downloaded original
///
/// The URL path wins; the MIME type is only consulted when the path has no
/// usable extension.
pub fn choose_extension(url: &Url, mime: Option<&str>) -> String {
    extension_from_path(url).unwrap_or_else(|| extension_for_mime(mime))
}

/// Strips parameters from a Content-Type value and lowercases it
///
/// `text/html; charset=UTF-8` becomes `text/html`.
pub fn essence(content_type: &str) -> String {
    content_type
        .split(';')
        .next()
        .unwrap_or_default()
        .trim()
        .to_ascii_lowercase()
}
