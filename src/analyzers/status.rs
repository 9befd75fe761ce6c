use crate::analyzers::types::PanelStatus;

/// Classifies the panel fleet from the number of panels currently online.
///
/// | Online          | Status        |
/// |-----------------|---------------|
/// | >= total        | Online        |
/// | 1 ..= total - 1 | SomeOffline   |
/// | 0               | Offline       |
pub fn panel_status(online: u32, total: u32) -> PanelStatus {
    match online {
        0 => PanelStatus::Offline,
        n if n >= total => PanelStatus::Online,
        _ => PanelStatus::SomeOffline,
    }
}
