/*!
 * # Permissions Module
 *
 * Permission strings are `<resource>:<action>`; `<resource>:*` grants every
 * action on a resource.
 */

/// Permission actions
pub struct Actions;

impl Actions {
    pub const ALL: &'static str = "*";
}

/// Permission string constants used by the routers.
pub mod consts {
    pub const VENDORS_READ: &str = "vendors:read";
    pub const VENDORS_MANAGE: &str = "vendors:manage";
    pub const PURCHASE_ORDERS_READ: &str = "purchaseorders:read";
    pub const PURCHASE_ORDERS_MANAGE: &str = "purchaseorders:manage";
}

/// Whether `granted` satisfies `required`, honouring `resource:*` wildcards.
pub fn permission_matches(granted: &str, required: &str) -> bool {
    if granted == required {
        return true;
    }
    match (granted.split_once(':'), required.split_once(':')) {
        (Some((g_res, Actions::ALL)), Some((r_res, _))) => g_res == r_res,
        _ => false,
    }
}
