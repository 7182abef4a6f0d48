use crate::model::keys::ModuleKey;

/// Static reading material for a learning module.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LearningModule {
    pub key: ModuleKey,
    pub title: &'static str,
    pub summary: &'static str,
    pub sections: &'static [ModuleSection],
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ModuleSection {
    pub heading: &'static str,
    pub items: &'static [&'static str],
}

/// A phone line worth copying during an emergency.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EmergencyContact {
    pub name: &'static str,
    pub number: &'static str,
}
