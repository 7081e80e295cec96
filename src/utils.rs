use std::env;
use std::path::Path;

use urlencoding::decode;

/// Normalize a source path recorded in debug info before hitting the
/// filesystem: decode file:// URIs, resolve relative paths against the
/// working directory, fold . and .. away, and force forward slashes.
pub fn canonicalize_path(source_path: &str) -> String {
    let mut path_str = source_path.to_string();

    if let Some(rest) = path_str.strip_prefix("file://") {
        path_str = decode(rest)
            .map(|decoded| decoded.into_owned())
            .unwrap_or_else(|_| rest.to_string());
    }

    let path = Path::new(&path_str);
    let absolute = if path.is_absolute() {
        path.to_path_buf()
    } else {
        env::current_dir().unwrap_or_default().join(path)
    };

    // dunce resolves . and .. and avoids \\?\ verbatim paths on Windows
    let canonical = dunce::canonicalize(&absolute).unwrap_or(absolute);

    canonical.to_string_lossy().replace('\\', "/")
}
