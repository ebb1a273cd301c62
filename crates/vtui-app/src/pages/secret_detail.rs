//! Detail view for a single discovered secret

use vtui_core::{Capability, CapabilitySet, Mount, SecretTreeRef};

use crate::effect::Effect;
use crate::input_key::{InputKey, KeyBinding};
use crate::message::Message;
use crate::view::{Context, Page, PageId};

/// Owned snapshot of a tree node, independent of later refreshes
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SecretDetail {
    pub full_path: String,
    pub mount: Mount,
    pub capabilities: Option<CapabilitySet>,
}

impl SecretDetail {
    pub fn from_node(node: &SecretTreeRef) -> Self {
        Self {
            full_path: node.full_path(),
            mount: node.mount.as_ref().clone(),
            capabilities: node.capabilities.clone(),
        }
    }
}

#[derive(Debug)]
pub struct SecretDetailPage {
    id: PageId,
    detail: SecretDetail,
}

impl SecretDetailPage {
    pub fn new(detail: SecretDetail) -> Self {
        Self {
            id: PageId::unique("detail"),
            detail,
        }
    }
}

impl Page for SecretDetailPage {
    fn id(&self) -> &PageId {
        &self.id
    }

    fn title(&self) -> &str {
        &self.detail.full_path
    }

    fn init(&mut self, _ctx: &Context) -> Effect {
        Effect::none()
    }

    fn handle(&mut self, _msg: &Message, _ctx: &Context) -> Effect {
        Effect::none()
    }

    fn render(&self) -> String {
        let mount = &self.detail.mount;
        let engine = match mount.version {
            Some(v) => format!("{} v{}", mount.mount_type, v),
            None => mount.mount_type.clone(),
        };
        let access = match &self.detail.capabilities {
            None => "unknown".to_string(),
            Some(caps) if caps.allows(Capability::Read) => format!("{} (readable)", caps),
            Some(caps) => caps.to_string(),
        };
        format!(
            "path:   {}\nmount:  {} ({})\naccess: {}",
            self.detail.full_path, mount.path, engine, access
        )
    }

    fn short_help(&self) -> Vec<KeyBinding> {
        vec![KeyBinding::new([InputKey::Esc], "back")]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_detail() {
        let page = SecretDetailPage::new(SecretDetail {
            full_path: "secret/app/db".into(),
            mount: Mount::kv("secret", 2),
            capabilities: Some([Capability::Read, Capability::List].into_iter().collect()),
        });
        let rendered = page.render();
        assert!(rendered.contains("path:   secret/app/db"));
        assert!(rendered.contains("mount:  secret/ (kv v2)"));
        assert!(rendered.contains("(readable)"));
        assert_eq!(page.title(), "secret/app/db");
    }

    #[test]
    fn test_unknown_capabilities() {
        let page = SecretDetailPage::new(SecretDetail {
            full_path: "kv/x".into(),
            mount: Mount::new("kv", "kv"),
            capabilities: None,
        });
        assert!(page.render().ends_with("access: unknown"));
    }
}
