//! Role mapping: which submitted table plays which part of the schema.
//!
//! The submission ships a JSON object such as
//!
//! ```json
//! {
//!   "tabela_que_contem_plano": "plano",
//!   "tabela_que_contem_usuario": "usuario"
//! }
//! ```
//!
//! Every key is optional here. A missing key only fails the checks that need
//! that role.

use std::fmt;

use camino::Utf8Path;
use facet::Facet;

use crate::{Error, Result};

/// A semantic role a submitted table can play.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Role {
    Plan,
    User,
    Song,
    Album,
    Artist,
    ReproductionHistory,
    FollowingArtist,
}

impl Role {
    pub const ALL: [Role; 7] = [
        Role::Plan,
        Role::User,
        Role::Song,
        Role::Album,
        Role::Artist,
        Role::ReproductionHistory,
        Role::FollowingArtist,
    ];

    /// Key of this role in the mapping file.
    pub fn key(self) -> &'static str {
        match self {
            Role::Plan => "tabela_que_contem_plano",
            Role::User => "tabela_que_contem_usuario",
            Role::Song => "tabela_que_contem_cancao",
            Role::Album => "tabela_que_contem_album",
            Role::Artist => "tabela_que_contem_artista",
            Role::ReproductionHistory => "tabela_que_contem_historico_reproducao",
            Role::FollowingArtist => "tabela_que_contem_seguindo_artista",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

/// Role name to table name, as submitted.
#[derive(Facet, Debug, Clone, Default, PartialEq)]
pub struct RoleMapping {
    #[facet(default)]
    pub tabela_que_contem_plano: Option<String>,

    #[facet(default)]
    pub tabela_que_contem_usuario: Option<String>,

    #[facet(default)]
    pub tabela_que_contem_cancao: Option<String>,

    #[facet(default)]
    pub tabela_que_contem_album: Option<String>,

    #[facet(default)]
    pub tabela_que_contem_artista: Option<String>,

    #[facet(default)]
    pub tabela_que_contem_historico_reproducao: Option<String>,

    #[facet(default)]
    pub tabela_que_contem_seguindo_artista: Option<String>,
}

impl RoleMapping {
    /// Parse a mapping from JSON text.
    pub fn from_json(path: &Utf8Path, source: &str) -> Result<Self> {
        facet_json::from_str(source).map_err(|e| Error::RoleMapping {
            path: path.to_owned(),
            message: e.to_string(),
        })
    }

    /// Read and parse the mapping file.
    pub fn load(path: &Utf8Path) -> Result<Self> {
        let source = std::fs::read_to_string(path).map_err(|e| Error::io(path, e))?;
        Self::from_json(path, &source)
    }

    /// Table name for `role`, if the submission mapped it.
    pub fn table(&self, role: Role) -> Option<&str> {
        let name = match role {
            Role::Plan => &self.tabela_que_contem_plano,
            Role::User => &self.tabela_que_contem_usuario,
            Role::Song => &self.tabela_que_contem_cancao,
            Role::Album => &self.tabela_que_contem_album,
            Role::Artist => &self.tabela_que_contem_artista,
            Role::ReproductionHistory => &self.tabela_que_contem_historico_reproducao,
            Role::FollowingArtist => &self.tabela_que_contem_seguindo_artista,
        };
        name.as_deref()
    }

    /// Roles with no table assigned.
    pub fn unmapped(&self) -> Vec<Role> {
        Role::ALL
            .into_iter()
            .filter(|role| self.table(*role).is_none())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const FULL: &str = r#"{
        "tabela_que_contem_plano": "plano",
        "tabela_que_contem_usuario": "usuario",
        "tabela_que_contem_cancao": "cancao",
        "tabela_que_contem_album": "album",
        "tabela_que_contem_artista": "artista",
        "tabela_que_contem_historico_reproducao": "historico_reproducao",
        "tabela_que_contem_seguindo_artista": "seguindo_artista"
    }"#;

    fn parse(source: &str) -> Result<RoleMapping> {
        RoleMapping::from_json(Utf8Path::new("desafio1.json"), source)
    }

    #[test]
    fn parses_every_role() {
        let mapping = parse(FULL).unwrap();
        assert_eq!(mapping.table(Role::Plan), Some("plano"));
        assert_eq!(
            mapping.table(Role::ReproductionHistory),
            Some("historico_reproducao")
        );
        assert!(mapping.unmapped().is_empty());
    }

    #[test]
    fn missing_keys_are_unmapped() {
        let mapping = parse(r#"{ "tabela_que_contem_plano": "plano" }"#).unwrap();
        assert_eq!(mapping.table(Role::User), None);
        assert_eq!(mapping.unmapped().len(), 6);
        assert!(!mapping.unmapped().contains(&Role::Plan));
    }

    #[test]
    fn malformed_json_is_an_error() {
        let err = parse("{ not json").unwrap_err();
        assert!(matches!(err, Error::RoleMapping { .. }), "{err}");
        assert!(err.to_string().starts_with("invalid role mapping in desafio1.json"));
    }

    #[test]
    fn keys_match_mapping_fields() {
        let mut keys: Vec<&str> = Role::ALL.iter().map(|r| r.key()).collect();
        keys.sort_unstable();
        keys.dedup();
        assert_eq!(keys.len(), Role::ALL.len());
        assert!(FULL.contains(Role::FollowingArtist.key()));
    }
}
