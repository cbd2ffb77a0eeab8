use serde::{Deserialize, Serialize};

/// A weighted edge between two nodes, keyed by the innovation number of the structural mutation
/// that created it
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConnectionGene {
    pub inno: usize,
    pub from: usize,
    pub to: usize,
    pub weight: f64,
    pub enabled: bool,
}

impl ConnectionGene {
    pub fn new(inno: usize, from: usize, to: usize, weight: f64) -> Self {
        Self {
            inno,
            from,
            to,
            weight,
            enabled: true,
        }
    }

    #[inline]
    pub fn path(&self) -> (usize, usize) {
        (self.from, self.to)
    }

    #[inline]
    pub fn enable(&mut self) {
        self.enabled = true;
    }

    #[inline]
    pub fn disable(&mut self) {
        self.enabled = false;
    }

    /// Split this connection around `center`, disabling it. The returned pair is
    /// `from -{1}> center -{weight}> to`, so the path behaves as before at first.
    pub fn bisect(&mut self, center: usize, innos: (usize, usize)) -> (Self, Self) {
        self.disable();
        (
            Self::new(innos.0, self.from, center, 1.),
            Self::new(innos.1, center, self.to, self.weight),
        )
    }
}

impl Default for ConnectionGene {
    fn default() -> Self {
        Self {
            inno: 0,
            from: 0,
            to: 0,
            weight: 0.,
            enabled: true,
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_bisect() {
        let mut c = ConnectionGene::new(0, 3, 7, -0.75);
        let (l, r) = c.bisect(9, (1, 2));

        assert!(!c.enabled);
        assert_eq!(l, ConnectionGene::new(1, 3, 9, 1.));
        assert_eq!(r, ConnectionGene::new(2, 9, 7, -0.75));
        assert!(l.enabled && r.enabled);
    }

    #[test]
    fn test_toggle() {
        let mut c = ConnectionGene::default();
        assert!(c.enabled);
        c.disable();
        assert!(!c.enabled);
        c.enable();
        assert!(c.enabled);
        assert_eq!(c.path(), (0, 0));
    }
}
