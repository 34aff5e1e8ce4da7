use serde::{Deserialize, Serialize};

/// Kind of institution that runs a benefit program.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InstitutionKind {
    Bank,
    CardBrand,
    Retailer,
    FuelStation,
    Service,
    #[serde(other)]
    Unknown,
}

impl Default for InstitutionKind {
    fn default() -> Self {
        Self::Unknown
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Institution {
    pub id: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub brand_name: Option<String>,
    #[serde(rename = "type", default)]
    pub kind: InstitutionKind,
}

impl Institution {
    /// Brand name if the store has one, otherwise the legal name.
    pub fn display_name(&self) -> &str {
        self.brand_name.as_deref().unwrap_or(&self.name)
    }
}

/// A loyalty/cashback program offered by an institution.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BenefitProgram {
    pub id: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default = "default_true")]
    pub is_active: bool,
    #[serde(default)]
    pub requires_registration: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub institution: Option<Institution>,
}

/// A program the user has enrolled in.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserProgram {
    pub id: String,
    pub user_id: String,
    pub program_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_nickname: Option<String>,
    #[serde(default)]
    pub is_primary: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub added_at: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub program: Option<BenefitProgram>,
}

/// Programs from `programs` the user has not enrolled in yet, in input order.
pub fn available_programs(
    programs: Vec<BenefitProgram>,
    enrolled: &[UserProgram],
) -> Vec<BenefitProgram> {
    programs
        .into_iter()
        .filter(|p| !enrolled.iter().any(|up| up.program_id == p.id))
        .collect()
}

fn default_true() -> bool {
    true
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_program_with_nested_institution() {
        let json = r#"{
            "id": "p1",
            "name": "Livelo",
            "requires_registration": true,
            "institution": {"id": "i1", "name": "Banco do Brasil S.A.", "brand_name": "BB", "type": "bank"}
        }"#;
        let program: BenefitProgram = serde_json::from_str(json).unwrap();
        assert!(program.is_active);
        let inst = program.institution.unwrap();
        assert_eq!(inst.kind, InstitutionKind::Bank);
        assert_eq!(inst.display_name(), "BB");
    }

    #[test]
    fn test_available_excludes_enrolled() {
        let program = |id: &str| BenefitProgram {
            id: id.to_string(),
            name: id.to_uppercase(),
            description: None,
            is_active: true,
            requires_registration: false,
            institution: None,
        };
        let enrolled: UserProgram = serde_json::from_str(
            r#"{"id": "u1", "user_id": "user-1", "program_id": "p2"}"#,
        )
        .unwrap();

        let all = vec![program("p1"), program("p2"), program("p3")];
        let ids: Vec<_> = available_programs(all.clone(), &[enrolled])
            .into_iter()
            .map(|p| p.id)
            .collect();
        assert_eq!(ids, vec!["p1", "p3"]);
        assert_eq!(available_programs(all.clone(), &[]), all);
    }

    #[test]
    fn test_unknown_institution_kind() {
        let json = r#"{"id": "i2", "name": "Acme", "type": "airline"}"#;
        let inst: Institution = serde_json::from_str(json).unwrap();
        assert_eq!(inst.kind, InstitutionKind::Unknown);
        assert_eq!(inst.display_name(), "Acme");
    }
}
