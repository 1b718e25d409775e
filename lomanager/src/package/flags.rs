//! Selection state flags of a virtual package.
//!
//! Flags are grouped by operation (removal, install) plus the derived
//! download mark. Bulk operations never enumerate struct fields by name;
//! they go through the explicit [`Flag`] list instead.

use serde::Serialize;

/// One selection flag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Flag {
    Removable,
    RemoveVisible,
    RemoveEnabled,
    MarkedForRemoval,
    Installable,
    InstallVisible,
    InstallEnabled,
    MarkedForInstall,
    MarkedForDownload,
}

impl Flag {
    /// Flags cleared by a bulk reset.
    ///
    /// `installed` is not a flag: it is ground truth and only changes when
    /// the tree is rebuilt.
    pub const RESETTABLE: [Flag; 9] = [
        Flag::Removable,
        Flag::RemoveVisible,
        Flag::RemoveEnabled,
        Flag::MarkedForRemoval,
        Flag::Installable,
        Flag::InstallVisible,
        Flag::InstallEnabled,
        Flag::MarkedForInstall,
        Flag::MarkedForDownload,
    ];
}

/// Flag set carried by every virtual package.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct PackageFlags {
    pub removable: bool,
    pub remove_visible: bool,
    pub remove_enabled: bool,
    pub marked_for_removal: bool,
    pub installable: bool,
    pub install_visible: bool,
    pub install_enabled: bool,
    pub marked_for_install: bool,
    pub marked_for_download: bool,
}

impl PackageFlags {
    /// Read a single flag.
    pub fn get(&self, flag: Flag) -> bool {
        match flag {
            Flag::Removable => self.removable,
            Flag::RemoveVisible => self.remove_visible,
            Flag::RemoveEnabled => self.remove_enabled,
            Flag::MarkedForRemoval => self.marked_for_removal,
            Flag::Installable => self.installable,
            Flag::InstallVisible => self.install_visible,
            Flag::InstallEnabled => self.install_enabled,
            Flag::MarkedForInstall => self.marked_for_install,
            Flag::MarkedForDownload => self.marked_for_download,
        }
    }

    /// Write a single flag.
    pub fn set(&mut self, flag: Flag, value: bool) {
        let slot = match flag {
            Flag::Removable => &mut self.removable,
            Flag::RemoveVisible => &mut self.remove_visible,
            Flag::RemoveEnabled => &mut self.remove_enabled,
            Flag::MarkedForRemoval => &mut self.marked_for_removal,
            Flag::Installable => &mut self.installable,
            Flag::InstallVisible => &mut self.install_visible,
            Flag::InstallEnabled => &mut self.install_enabled,
            Flag::MarkedForInstall => &mut self.marked_for_install,
            Flag::MarkedForDownload => &mut self.marked_for_download,
        };
        *slot = value;
    }

    /// Clear every flag in [`Flag::RESETTABLE`].
    pub fn reset(&mut self) {
        for flag in Flag::RESETTABLE {
            self.set(flag, false);
        }
    }
}
