//! html5ever serialization for ArenaDom.

use std::io;

use html5ever::serialize::{Serialize, Serializer, TraversalScope};

use super::arena::{ArenaDom, ArenaNodeData, ArenaNodeId};

/// A node that html5ever's serializer can walk.
pub struct SerializableNode<'a> {
    pub dom: &'a ArenaDom,
    pub id: ArenaNodeId,
}

impl SerializableNode<'_> {
    fn serialize_node<S: Serializer>(&self, serializer: &mut S, id: ArenaNodeId) -> io::Result<()> {
        let Some(node) = self.dom.get(id) else {
            return Ok(());
        };

        match &node.data {
            ArenaNodeData::Document => self.serialize_children(serializer, id),
            ArenaNodeData::Element { name, attrs, .. } => {
                serializer.start_elem(
                    name.clone(),
                    attrs.iter().map(|a| (&a.name, a.value.as_str())),
                )?;
                self.serialize_children(serializer, id)?;
                serializer.end_elem(name.clone())
            }
            ArenaNodeData::Text(text) => serializer.write_text(text),
            ArenaNodeData::Comment(text) => serializer.write_comment(text),
            ArenaNodeData::ProcessingInstruction { target, data } => {
                serializer.write_processing_instruction(target, data)
            }
            ArenaNodeData::Doctype { name, .. } => serializer.write_doctype(name),
        }
    }

    fn serialize_children<S: Serializer>(
        &self,
        serializer: &mut S,
        id: ArenaNodeId,
    ) -> io::Result<()> {
        for child in self.dom.children(id) {
            self.serialize_node(serializer, child)?;
        }
        Ok(())
    }
}

impl Serialize for SerializableNode<'_> {
    fn serialize<S>(&self, serializer: &mut S, traversal_scope: TraversalScope) -> io::Result<()>
    where
        S: Serializer,
    {
        match traversal_scope {
            TraversalScope::IncludeNode => self.serialize_node(serializer, self.id),
            TraversalScope::ChildrenOnly(_) => self.serialize_children(serializer, self.id),
        }
    }
}
