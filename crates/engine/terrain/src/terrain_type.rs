use serde::{Deserialize, Serialize};

/// Surface material of a height field cell
///
/// Drives the friction and restitution coefficients picked by the physics
/// crate. Index order is stable and used for compact storage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TerrainType {
    Ice,
    #[default]
    Snow,
    Rock,
    Powder,
}

impl TerrainType {
    /// All terrain types in index order
    pub const ALL: [TerrainType; 4] = [
        TerrainType::Ice,
        TerrainType::Snow,
        TerrainType::Rock,
        TerrainType::Powder,
    ];

    #[inline]
    pub fn index(self) -> usize {
        self as usize
    }

    #[inline]
    pub fn from_index(index: usize) -> Option<Self> {
        Self::ALL.get(index).copied()
    }

    pub fn name(self) -> &'static str {
        match self {
            TerrainType::Ice => "ice",
            TerrainType::Snow => "snow",
            TerrainType::Rock => "rock",
            TerrainType::Powder => "powder",
        }
    }
}

impl std::fmt::Display for TerrainType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_index_roundtrip() {
        for terrain in TerrainType::ALL {
            assert_eq!(TerrainType::from_index(terrain.index()), Some(terrain));
        }
        assert_eq!(TerrainType::from_index(4), None);
    }

    #[test]
    fn test_deserialize_lowercase() {
        #[derive(Deserialize)]
        struct Wrapper {
            terrain: TerrainType,
        }

        let parsed: Wrapper = toml::from_str("terrain = \"powder\"").unwrap();
        assert_eq!(parsed.terrain, TerrainType::Powder);
    }
}
