#[derive(Debug, Clone, PartialEq)]
pub struct Atom {
    pub species: String,
    pub position: [f64; 3],
}

impl Atom {
    pub fn new(species: impl Into<String>, position: [f64; 3]) -> Self {
        Self {
            species: species.into(),
            position,
        }
    }
}
