//! Static hosting for the pre-built single-page app.

use tower_http::services::{ServeDir, ServeFile};

use crate::config::AssetsConfig;

/// Serves files under the asset root. Anything that does not resolve to a
/// file, directories and `/` included, gets the index document so
/// client-side routes load the app. `ServeDir` already refuses `..` path
/// segments.
pub fn spa_service(assets: &AssetsConfig) -> ServeDir<ServeFile> {
    ServeDir::new(&assets.root_dir)
        .append_index_html_on_directories(false)
        .fallback(ServeFile::new(assets.index_path()))
}
