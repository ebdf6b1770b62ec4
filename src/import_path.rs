//! Import path relativization.
//!
//! Symbol home paths are project-relative (`./foo/bar_pb.js`) or package
//! paths (`@bufbuild/protobuf`). Import statements need the former expressed
//! relative to the importing file.

fn is_relative(path: &str) -> bool {
    path.starts_with("./") || path.starts_with("../")
}

fn segments(path: &str) -> Vec<&str> {
    path.strip_prefix("./")
        .unwrap_or(path)
        .split('/')
        .filter(|p| !p.is_empty())
        .collect()
}

/// Rewrite `import_path` relative to the directory of `importer`.
///
/// Package paths are returned unchanged.
pub fn make_import_path_relative(importer: &str, import_path: &str) -> String {
    if !is_relative(import_path) {
        return import_path.to_string();
    }
    let mut from = segments(importer);
    from.pop();
    let to = segments(import_path);

    let common = from
        .iter()
        .zip(to.iter())
        .take_while(|(a, b)| a == b)
        .count();

    let mut parts: Vec<&str> = vec![".."; from.len() - common];
    parts.extend_from_slice(&to[common..]);
    let joined = parts.join("/");
    if is_relative(&joined) {
        joined
    } else {
        format!("./{}", joined)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_package_path_untouched() {
        assert_eq!(
            make_import_path_relative("./a/b_pb.js", "@bufbuild/protobuf"),
            "@bufbuild/protobuf"
        );
    }

    #[test]
    fn test_same_directory() {
        assert_eq!(
            make_import_path_relative("./buf/eliza_twirp.js", "./buf/eliza_pb.js"),
            "./eliza_pb.js"
        );
    }

    #[test]
    fn test_root_files() {
        assert_eq!(make_import_path_relative("./a_pb.js", "./b_pb.js"), "./b_pb.js");
    }

    #[test]
    fn test_parent_and_sibling_directories() {
        assert_eq!(
            make_import_path_relative("./google/protobuf/a_pb.js", "./google/b_pb.js"),
            "../b_pb.js"
        );
        assert_eq!(
            make_import_path_relative("./x/y/a_pb.js", "./x/z/b_pb.js"),
            "../z/b_pb.js"
        );
        assert_eq!(
            make_import_path_relative("./a_pb.js", "./deep/dir/b_pb.js"),
            "./deep/dir/b_pb.js"
        );
    }
}
