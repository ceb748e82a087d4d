//! Category tree traversal
//!
//! Walks a site's navigation tree depth-first, pre-order, children in source
//! order, yielding one `(CategoryPath, target)` pair per node that carries a
//! followable link. The walk keeps an explicit stack instead of recursing, so
//! tree depth is bounded only by the tree itself.

use crate::catalog::model::{CategoryPath, NavigationNode};

/// Lazy pre-order walk over a navigation tree
pub struct CategoryWalk<'a> {
    stack: Vec<(&'a NavigationNode, CategoryPath)>,
}

impl<'a> Iterator for CategoryWalk<'a> {
    type Item = (CategoryPath, &'a str);

    fn next(&mut self) -> Option<Self::Item> {
        while let Some((node, parent_path)) = self.stack.pop() {
            let path = parent_path.child(&node.label);

            // Reversed so the first child is popped next
            for child in node.children.iter().rev() {
                self.stack.push((child, path.clone()));
            }

            match node.link() {
                Some(target) => return Some((path, target)),
                None => {
                    tracing::trace!("Skipping menu entry without a followable link: {}", path);
                }
            }
        }

        None
    }
}

/// Walks `node` and its descendants below `path_so_far`
///
/// # Example
///
/// ```
/// use catalog_ripple::catalog::{walk, CategoryPath, NavigationNode};
///
/// let men = NavigationNode::new("Men", Some("/men".to_string())).with_children(vec![
///     NavigationNode::new("Shoes", Some("/men/shoes".to_string())),
/// ]);
///
/// let listings: Vec<_> = walk(&men, &CategoryPath::root()).collect();
/// assert_eq!(listings.len(), 2);
/// assert_eq!(listings[1].0.labels(), ["Men", "Shoes"]);
/// assert_eq!(listings[1].1, "/men/shoes");
/// ```
pub fn walk<'a>(node: &'a NavigationNode, path_so_far: &CategoryPath) -> CategoryWalk<'a> {
    CategoryWalk {
        stack: vec![(node, path_so_far.clone())],
    }
}

/// Walks every top-level node in order, each from the root path
pub fn walk_forest(roots: &[NavigationNode]) -> impl Iterator<Item = (CategoryPath, &str)> + '_ {
    roots
        .iter()
        .flat_map(|root| walk(root, &CategoryPath::root()))
}
