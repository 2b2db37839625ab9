use std_util::str;

/// An entity name as declared, along with its snake-case parts.
#[derive(Debug, Clone, Eq, PartialEq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Name {
    src: String,
    pub parts: Vec<String>,
}

impl Name {
    pub fn new(src: &str) -> Self {
        let snake = str::snake_case(src);
        let parts = snake.split('_').map(String::from).collect();
        Self {
            src: src.to_string(),
            parts,
        }
    }

    /// The name exactly as it was declared.
    pub fn as_str(&self) -> &str {
        &self.src
    }

    pub fn snake_case(&self) -> String {
        self.parts.join("_")
    }

    pub fn plural(&self) -> String {
        str::pluralize(&self.src)
    }
}

impl std::fmt::Display for Name {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.src)
    }
}

/// How derived attribute names are cased on an entity.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Naming {
    /// `FatherId`, `homeTeamId`. The leading segment keeps its case.
    #[default]
    CamelCase,

    /// `father_id`, `home_team_id`. Selected by declaring the entity
    /// `underscored`.
    SnakeCase,
}

impl Naming {
    pub fn from_underscored(underscored: bool) -> Self {
        if underscored {
            Naming::SnakeCase
        } else {
            Naming::CamelCase
        }
    }

    /// Joins a prefix and a key name into a single attribute name, e.g.
    /// `("Father", "id")` becomes `FatherId` or `father_id`.
    pub fn join(self, prefix: &str, key: &str) -> String {
        let joined = format!("{prefix}_{key}");
        match self {
            Naming::CamelCase => str::camelize(&joined),
            Naming::SnakeCase => str::snake_case(&joined),
        }
    }
}
