use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum NodeKind {
    Bias,
    Input,
    Hidden,
    Output,
}

impl NodeKind {
    /// Sensors receive their value from outside the network, and never take input from a
    /// connection
    #[inline]
    pub fn is_sensor(&self) -> bool {
        matches!(self, Self::Bias | Self::Input)
    }

    #[inline]
    pub fn is_output(&self) -> bool {
        matches!(self, Self::Output)
    }
}

/// A neuron in the genetic encoding. Its id is shared by every genome that inherited it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct NodeGene {
    pub id: usize,
    pub kind: NodeKind,
}

impl NodeGene {
    pub fn new(id: usize, kind: NodeKind) -> Self {
        Self { id, kind }
    }

    #[inline]
    pub fn is_sensor(&self) -> bool {
        self.kind.is_sensor()
    }

    #[inline]
    pub fn is_output(&self) -> bool {
        self.kind.is_output()
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_node_kinds() {
        assert!(NodeGene::new(0, NodeKind::Bias).is_sensor());
        assert!(NodeGene::new(1, NodeKind::Input).is_sensor());
        assert!(!NodeGene::new(2, NodeKind::Hidden).is_sensor());
        assert!(!NodeGene::new(3, NodeKind::Output).is_sensor());
        assert!(NodeGene::new(3, NodeKind::Output).is_output());
        assert!(!NodeGene::new(2, NodeKind::Hidden).is_output());
    }
}
