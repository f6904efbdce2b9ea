//! # Shared Constants
//!
//! Names both ends of the protocol agree on.

/// Identity constants
pub mod ids {
    /// Prefix for widget ids
    pub const WIDGET_PREFIX: &str = "w";

    /// Prefix for remote objects that are not widgets
    pub const REMOTE_OBJECT_PREFIX: &str = "r";
}

/// Wire type names of the shipped widget kinds
pub mod types {
    pub const SHELL: &str = "rwt.widgets.Shell";
    pub const MENU: &str = "rwt.widgets.Menu";
    pub const MENU_ITEM: &str = "rwt.widgets.MenuItem";
}

/// Well-known property names
pub mod props {
    pub const STYLE: &str = "style";
    pub const INDEX: &str = "index";
    pub const TEXT: &str = "text";
    pub const ENABLED: &str = "enabled";
    pub const VISIBILITY: &str = "visibility";
    pub const ACTIVE: &str = "active";
    pub const SELECTION: &str = "selection";
    pub const MENU: &str = "menu";
    pub const IMAGE: &str = "image";
    pub const CUSTOM_VARIANT: &str = "customVariant";
}

/// Event types, used both as listen keys and as notify names
pub mod events {
    pub const SELECTION: &str = "Selection";
    pub const HELP: &str = "Help";
    pub const SHOW: &str = "Show";
    pub const HIDE: &str = "Hide";
    pub const ARM: &str = "Arm";
    pub const CLOSE: &str = "Close";
}

/// Prefix of a rendered custom variant (`"variant_" + name`)
pub const CUSTOM_VARIANT_PREFIX: &str = "variant_";
