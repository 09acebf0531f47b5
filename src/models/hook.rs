use serde::Deserialize;

/// Workspace field of the statusLine payload. Older hosts send a bare path.
#[derive(Deserialize, Debug)]
#[serde(untagged)]
pub enum HookWorkspace {
    Path(String),
    Dirs {
        #[serde(default)]
        current_dir: Option<String>,
        #[serde(default)]
        project_dir: Option<String>,
    },
}

#[derive(Deserialize, Debug, Default)]
pub struct HookJson {
    #[serde(default)]
    pub workspace: Option<HookWorkspace>,
}

impl HookJson {
    /// Project directory when known, otherwise the current directory
    pub fn workspace_path(&self) -> Option<&str> {
        let path = match self.workspace.as_ref()? {
            HookWorkspace::Path(p) => Some(p.as_str()),
            HookWorkspace::Dirs {
                current_dir,
                project_dir,
            } => project_dir
                .as_deref()
                .filter(|p| !p.is_empty())
                .or(current_dir.as_deref()),
        };
        path.filter(|p| !p.is_empty())
    }
}
