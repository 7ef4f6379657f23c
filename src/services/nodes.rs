use crate::domain::errors::NodesError;
use std::path::Path;

pub fn parse_nodes(raw: &str) -> Vec<String> {
    raw.lines()
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .map(str::to_string)
        .collect()
}

pub fn load_nodes(path: &Path) -> Result<Vec<String>, NodesError> {
    if !path.exists() {
        return Err(NodesError::NotFound(path.to_path_buf()));
    }
    let raw = std::fs::read_to_string(path).map_err(|source| NodesError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    let nodes = parse_nodes(&raw);
    if nodes.is_empty() {
        return Err(NodesError::Empty(path.to_path_buf()));
    }
    tracing::debug!(path = %path.display(), count = nodes.len(), "loaded nodes");
    Ok(nodes)
}
