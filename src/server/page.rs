/// Chat page served at `/`.
pub(super) const INDEX_HTML: &str = include_str!("../../assets/index.html");
