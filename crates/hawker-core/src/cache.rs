//! Content-addressed audio cache.
//!
//! The filesystem is the source of truth — there is no in-memory index.
//! A task's audio lives at `<root>/<product-id>_<voice>_<md5-8>.mp3`,
//! so the same (product, voice, text) triple always maps to the same
//! file and concurrent writers can only ever race towards byte-equal
//! content.

use std::path::{Path, PathBuf};

use md5::{Digest, Md5};
use tracing::{debug, warn};

/// Public URL prefix under which the static audio tree is served.
pub const AUDIO_URL_PREFIX: &str = "/static/audio/";

/// Compute the filename stem and content hash for a task's text under
/// a given voice. The stem is `<product-id>_<voice>_<hash>` where hash
/// is the first 8 hex chars of md5(text).
pub fn identifier_for(product_id: &str, voice: &str, text: &str) -> (String, String) {
    let hash = hex::encode(Md5::digest(text.as_bytes()));
    let short = hash[..8].to_owned();
    (format!("{product_id}_{voice}_{short}"), short)
}

/// Public URL for a stem (or an `intros/...` identifier).
pub fn audio_url(stem: &str) -> String {
    format!("{AUDIO_URL_PREFIX}{stem}.mp3")
}

/// Absolute path of a stem under the audio root.
pub fn audio_path(root: &Path, stem: &str) -> PathBuf {
    root.join(format!("{stem}.mp3"))
}

/// Single stat of the expected path.
pub fn exists(root: &Path, stem: &str) -> bool {
    audio_path(root, stem).is_file()
}

/// Delete every `<product-id>_<voice>_*.mp3` under `root` except
/// `current_stem`. The pattern is intentionally narrow: the same
/// product's files under other voices survive.
///
/// Best effort — failures are logged and swallowed; the next eviction
/// after the next synthesis gets another chance.
pub fn evict_superseded(root: &Path, product_id: &str, voice: &str, current_stem: &str) {
    evict_matching(root, &format!("{product_id}_{voice}_"), current_stem);
}

/// Same policy for pre-warmed intros: delete every
/// `intros/<scene>_<voice>_*.mp3` whose identifier is not `current`.
pub fn evict_superseded_intros(root: &Path, scene: &str, voice: &str, current: &str) {
    let current_name = current.strip_prefix("intros/").unwrap_or(current);
    evict_matching(&root.join("intros"), &format!("{scene}_{voice}_"), current_name);
}

fn evict_matching(dir: &Path, prefix: &str, current_stem: &str) {
    let entries = match std::fs::read_dir(dir) {
        Ok(entries) => entries,
        // Directory absent simply means nothing was ever cached here.
        Err(_) => return,
    };

    for entry in entries.flatten() {
        let name = entry.file_name();
        let Some(name) = name.to_str() else { continue };
        if !name.starts_with(prefix) || !name.ends_with(".mp3") {
            continue;
        }
        if name == format!("{current_stem}.mp3") {
            continue;
        }
        match std::fs::remove_file(entry.path()) {
            Ok(()) => debug!(file = name, "evicted superseded audio"),
            Err(e) => warn!(file = name, error = %e, "failed to evict superseded audio"),
        }
    }
}
