//! Host and container path translation.
//!
//! The library database and the media server run in containers that see the
//! books directory under a different root (`/books` by default).

use std::path::{Path, PathBuf};

/// Maps paths between the host books directory and the container root.
#[derive(Debug, Clone)]
pub struct PathMapper {
    host_root: PathBuf,
    container_root: String,
}

impl PathMapper {
    pub fn new(host_root: impl Into<PathBuf>, container_root: impl Into<String>) -> Self {
        let container_root: String = container_root.into();
        let trimmed = container_root.trim_end_matches('/');
        Self {
            host_root: host_root.into(),
            container_root: if trimmed.is_empty() {
                "/".to_string()
            } else {
                trimmed.to_string()
            },
        }
    }

    /// Container path for a host path. Paths outside the host root are
    /// returned unchanged.
    pub fn to_container(&self, host: &Path) -> String {
        match host.strip_prefix(&self.host_root) {
            Ok(rest) if rest.as_os_str().is_empty() => self.container_root.clone(),
            Ok(rest) => {
                let rest = rest.to_string_lossy().replace('\\', "/");
                if self.container_root == "/" {
                    format!("/{rest}")
                } else {
                    format!("{}/{rest}", self.container_root)
                }
            }
            Err(_) => host.to_string_lossy().into_owned(),
        }
    }

    /// Host path for a container path, if it lies under the container root.
    pub fn to_host(&self, container: &str) -> Option<PathBuf> {
        let rest = if self.container_root == "/" {
            container.strip_prefix('/')?
        } else {
            let rest = container.strip_prefix(self.container_root.as_str())?;
            if rest.is_empty() {
                return Some(self.host_root.clone());
            }
            rest.strip_prefix('/')?
        };
        Some(self.host_root.join(rest))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_host_to_container() {
        let mapper = PathMapper::new("/srv/books", "/books");
        assert_eq!(
            mapper.to_container(Path::new("/srv/books/Frank Herbert/Dune/Dune.epub")),
            "/books/Frank Herbert/Dune/Dune.epub"
        );
        assert_eq!(mapper.to_container(Path::new("/elsewhere/x.pdf")), "/elsewhere/x.pdf");
    }

    #[test]
    fn test_container_to_host() {
        let mapper = PathMapper::new("/srv/books", "/books/");
        assert_eq!(
            mapper.to_host("/books/a/b.epub"),
            Some(PathBuf::from("/srv/books/a/b.epub"))
        );
        assert_eq!(mapper.to_host("/books"), Some(PathBuf::from("/srv/books")));
        // A sibling directory that only shares the prefix is not mapped.
        assert_eq!(mapper.to_host("/bookshelf/a.epub"), None);
        assert_eq!(mapper.to_host("/media/a.epub"), None);
    }
}
