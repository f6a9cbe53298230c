use super::Sections;
use crate::error::ConfigError;
use std::path::{Path, PathBuf};

/// Index of a node inside its [`ConfigTree`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct NodeId(usize);

impl NodeId {
    pub fn index(self) -> usize {
        self.0
    }
}

/// One `save.toml` and the sections it declares.
#[derive(Debug, Clone)]
pub struct ConfigNode {
    /// Path of the config file.
    pub location: PathBuf,
    /// Directory the config file lives in.
    pub directory: PathBuf,
    pub parent: Option<NodeId>,
    pub children: Vec<NodeId>,
    pub sections: Sections,
}

/// Arena of config nodes. Nodes only refer to each other by id, so the arena
/// owns everything and parents are always inserted before their children.
#[derive(Debug, Clone, Default)]
pub struct ConfigTree {
    nodes: Vec<ConfigNode>,
}

/// Merged and validated sections of one node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedConfig {
    pub node: NodeId,
    pub location: PathBuf,
    pub directory: PathBuf,
    pub sections: Sections,
}

impl ConfigTree {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a node. `parent` must already be in the tree; a tree has exactly
    /// one node without a parent.
    pub fn insert(
        &mut self,
        location: impl Into<PathBuf>,
        parent: Option<NodeId>,
        sections: Sections,
    ) -> Result<NodeId, ConfigError> {
        let location = location.into();
        match parent {
            None if !self.nodes.is_empty() => {
                return Err(ConfigError::InvalidValue {
                    section: "general",
                    message: format!(
                        "{} would be a second root config",
                        location.display()
                    ),
                });
            }
            Some(parent) if parent.0 >= self.nodes.len() => {
                return Err(ConfigError::InvalidValue {
                    section: "general",
                    message: format!(
                        "parent of {} is not in the tree",
                        location.display()
                    ),
                });
            }
            _ => {}
        }
        let directory = location
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_default();
        let id = NodeId(self.nodes.len());
        self.nodes.push(ConfigNode {
            location,
            directory,
            parent,
            children: Vec::new(),
            sections,
        });
        if let Some(parent) = parent {
            self.nodes[parent.0].children.push(id);
        }
        Ok(id)
    }

    pub fn root(&self) -> Option<NodeId> {
        (!self.nodes.is_empty()).then_some(NodeId(0))
    }

    pub fn node(&self, id: NodeId) -> &ConfigNode {
        &self.nodes[id.0]
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// `id` followed by its ancestors up to the root.
    pub fn ancestors(&self, id: NodeId) -> impl Iterator<Item = NodeId> + '_ {
        std::iter::successors(Some(id), move |current| self.nodes[current.0].parent)
    }

    /// Node ids in depth-first pre-order starting at the root.
    pub fn preorder(&self) -> Vec<NodeId> {
        let mut order = Vec::with_capacity(self.nodes.len());
        let mut stack: Vec<NodeId> = self.root().into_iter().collect();
        while let Some(id) = stack.pop() {
            order.push(id);
            stack.extend(self.nodes[id.0].children.iter().rev().copied());
        }
        order
    }

    /// Whether `id` lies in the subtree rooted at `ancestor`.
    pub fn is_within(&self, id: NodeId, ancestor: NodeId) -> bool {
        self.ancestors(id).any(|current| current == ancestor)
    }

    /// Fold the sections of the chain root-to-leaf.
    pub fn merge_with_parents(&self, id: NodeId) -> Sections {
        let chain: Vec<NodeId> = self.ancestors(id).collect();
        chain
            .iter()
            .rev()
            .fold(Sections::default(), |merged, current| {
                self.nodes[current.0].sections.merge_with_parent(&merged)
            })
    }

    pub fn resolve(&self, id: NodeId) -> Result<ResolvedConfig, ConfigError> {
        let sections = self.merge_with_parents(id).validate_and_set_defaults()?;
        let node = self.node(id);
        Ok(ResolvedConfig {
            node: id,
            location: node.location.clone(),
            directory: node.directory.clone(),
            sections,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{GeneralConfig, WarnPluginConfig};

    fn general(tags: &str, suite: &str) -> Sections {
        Sections {
            general: Some(GeneralConfig {
                tags: Some(tags.to_string()),
                suite_name: Some(suite.to_string()),
                ..GeneralConfig::default()
            }),
            ..Sections::default()
        }
    }

    fn chain(levels: &[Sections]) -> (ConfigTree, Vec<NodeId>) {
        let mut tree = ConfigTree::new();
        let mut ids = Vec::new();
        let mut dir = PathBuf::from("root");
        for sections in levels {
            let parent = ids.last().copied();
            let id = tree
                .insert(dir.join("save.toml"), parent, sections.clone())
                .unwrap();
            ids.push(id);
            dir = dir.join("nested");
        }
        (tree, ids)
    }

    fn tags(sections: &Sections) -> Option<&str> {
        sections.general.as_ref().and_then(|g| g.tags.as_deref())
    }

    #[test]
    fn two_level_tags_accumulate_and_suite_name_overrides() {
        let (tree, ids) = chain(&[
            general("Tag11, Tag12", "suiteName1"),
            general("Tag21", "suiteName2"),
        ]);
        let merged = tree.merge_with_parents(ids[1]);
        assert_eq!(tags(&merged), Some("Tag11, Tag12, Tag21"));
        assert_eq!(
            merged.general.as_ref().and_then(|g| g.suite_name.as_deref()),
            Some("suiteName2")
        );
    }

    #[test]
    fn four_level_chain_keeps_first_occurrence_order() {
        let (tree, ids) = chain(&[
            general("Tag11, Tag12", "suite1"),
            general("Tag21", "suite2"),
            general("Tag21, Tag31, Tag32", "suite3"),
            general("Tag11, Tag21", "suite4"),
        ]);
        let merged = tree.merge_with_parents(ids[3]);
        assert_eq!(tags(&merged), Some("Tag11, Tag12, Tag21, Tag31, Tag32"));
    }

    #[test]
    fn chain_fold_equals_pairwise_merge() {
        let levels = [
            general("Tag11, Tag12", "suite1"),
            general("Tag21", "suite2"),
            Sections {
                warn: Some(WarnPluginConfig {
                    exec_cmd: Some("lint".to_string()),
                    line_capture_group: Some(1),
                    message_capture_group: Some(3),
                    ..WarnPluginConfig::default()
                }),
                ..Sections::default()
            },
        ];
        let (tree, ids) = chain(&levels);
        let pairwise = levels[2].merge_with_parent(&levels[1].merge_with_parent(&levels[0]));
        assert_eq!(tree.merge_with_parents(ids[2]), pairwise);
    }

    #[test]
    fn ancestors_end_at_root() {
        let (tree, ids) = chain(&[
            general("A", "a"),
            general("B", "b"),
            general("C", "c"),
        ]);
        let walked: Vec<NodeId> = tree.ancestors(ids[2]).collect();
        assert_eq!(walked, vec![ids[2], ids[1], ids[0]]);
        assert!(tree.is_within(ids[2], ids[1]));
        assert!(!tree.is_within(ids[1], ids[2]));
        assert_eq!(tree.node(ids[1]).directory, PathBuf::from("root/nested"));
    }

    #[test]
    fn second_root_is_rejected() {
        let (mut tree, _) = chain(&[general("A", "a")]);
        assert!(tree
            .insert("other/save.toml", None, Sections::default())
            .is_err());
    }

    #[test]
    fn preorder_visits_parents_before_children() {
        let mut tree = ConfigTree::new();
        let root = tree.insert("t/save.toml", None, general("A", "a")).unwrap();
        let left = tree
            .insert("t/l/save.toml", Some(root), Sections::default())
            .unwrap();
        let right = tree
            .insert("t/r/save.toml", Some(root), Sections::default())
            .unwrap();
        let leaf = tree
            .insert("t/l/x/save.toml", Some(left), Sections::default())
            .unwrap();
        assert_eq!(tree.preorder(), vec![root, left, leaf, right]);
    }

    #[test]
    fn resolve_reports_missing_tags() {
        let (tree, ids) = chain(&[Sections::default()]);
        assert_eq!(tree.resolve(ids[0]).unwrap_err(), ConfigError::MissingTags);
    }
}
