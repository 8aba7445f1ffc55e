//! Directory listing
//!
//! Plain HTML index of a directory: one link per entry, sorted
//! case-insensitively. Directories get a trailing `/`, symlinks are shown
//! with a trailing `@`.

use crate::http::response::escape_html;
use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};
use std::fmt::Write;
use std::io;
use std::path::Path;
use tokio::fs;

/// Characters left unescaped in hrefs: unreserved plus `/`
const HREF_ENCODE_SET: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'~')
    .remove(b'/');

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListingEntry {
    pub name: String,
    pub is_dir: bool,
    pub is_symlink: bool,
}

impl ListingEntry {
    fn display_name(&self) -> String {
        if self.is_symlink {
            format!("{}@", self.name)
        } else if self.is_dir {
            format!("{}/", self.name)
        } else {
            self.name.clone()
        }
    }

    fn link_target(&self) -> String {
        if self.is_dir {
            format!("{}/", self.name)
        } else {
            self.name.clone()
        }
    }
}

/// Read `dir` and render its listing, titled with the decoded request path
pub async fn render(dir: &Path, display_path: &str) -> io::Result<String> {
    let mut entries = Vec::new();
    let mut read_dir = fs::read_dir(dir).await?;
    while let Some(entry) = read_dir.next_entry().await? {
        let file_type = entry.file_type().await?;
        let is_symlink = file_type.is_symlink();
        let is_dir = if is_symlink {
            // dangling links are listed as plain entries
            fs::metadata(entry.path())
                .await
                .is_ok_and(|m| m.is_dir())
        } else {
            file_type.is_dir()
        };
        entries.push(ListingEntry {
            name: entry.file_name().to_string_lossy().into_owned(),
            is_dir,
            is_symlink,
        });
    }
    Ok(render_html(display_path, entries))
}

pub fn render_html(display_path: &str, mut entries: Vec<ListingEntry>) -> String {
    entries.sort_by_cached_key(|e| e.name.to_lowercase());

    let title = format!("Directory listing for {}", escape_html(display_path));
    let mut html = format!(
        "<!DOCTYPE HTML>\n\
         <html lang=\"en\">\n\
         <head>\n\
         <meta charset=\"utf-8\">\n\
         <title>{title}</title>\n\
         </head>\n\
         <body>\n\
         <h1>{title}</h1>\n\
         <hr>\n\
         <ul>\n"
    );
    for entry in &entries {
        let _ = writeln!(
            html,
            "<li><a href=\"{}\">{}</a></li>",
            utf8_percent_encode(&entry.link_target(), HREF_ENCODE_SET),
            escape_html(&entry.display_name()),
        );
    }
    html.push_str("</ul>\n<hr>\n</body>\n</html>\n");
    html
}
