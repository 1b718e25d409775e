//! The caller-facing session.
//!
//! A session owns the configuration, the collaborators and the current
//! inventory. Selection requests mutate the inventory tree; procedures run
//! from a snapshot of it and the inventory is rebuilt afterwards, whatever
//! the outcome.

use std::path::Path;
use std::sync::Arc;

use serde::Serialize;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::changeset::{ChangeSet, PlannedChanges};
use crate::inventory::{build_tree, detect_installed, Inventory};
use crate::manager::{
    plan_local_copy, scan_local_copy, Collaborators, LocalCopyPlan, Procedure, ProcedurePlan,
    ProcedureReport, ProgressSink,
};
use crate::package::{Family, PackageFlags, VirtualPackage};
use crate::policy::{GlobalPolicy, PolicyInputs};
use crate::selection::{self, SelectionContext};
use crate::tree::NodeId;

use super::config::AppConfig;
use super::error::AppError;

/// Version of this client, compared against the advertised latest one.
pub const CLIENT_VERSION: &str = env!("CARGO_PKG_VERSION");

/// One package as shown to the caller.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PackageView {
    /// Stable for the lifetime of the current inventory.
    pub id: usize,
    pub parent: Option<usize>,
    pub family: Family,
    /// `core-packages` or a language code.
    pub kind: String,
    pub version: String,
    pub label: String,
    pub installed: bool,
    pub size: u64,
    pub flags: PackageFlags,
}

impl PackageView {
    fn new(id: NodeId, parent: Option<NodeId>, pkg: &VirtualPackage) -> Self {
        Self {
            id: id.0,
            parent: parent.map(|p| p.0).filter(|&p| p != 0),
            family: pkg.family,
            kind: pkg.kind.as_str().to_string(),
            version: pkg.version.clone(),
            label: pkg.label(),
            installed: pkg.installed,
            size: pkg.total_size(),
            flags: pkg.flags,
        }
    }
}

/// Snapshot of a session for display.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StatusReport {
    pub client_version: String,
    pub latest_libreoffice: String,
    pub packages: Vec<PackageView>,
    /// Why installs or removals are currently blocked.
    pub advisories: Vec<String>,
    /// Set when the installation is inconsistent and nothing can change.
    pub fatal: Option<String>,
    pub warnings: Vec<String>,
    pub planned: PlannedChanges,
}

/// Which selection option a request touches.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Operation {
    Install,
    Removal,
}

/// An interactive package-management session.
pub struct Session {
    config: AppConfig,
    collaborators: Collaborators,
    inventory: Inventory,
}

impl Session {
    /// Open a session on this machine.
    pub fn open(config: AppConfig) -> Result<Self, AppError> {
        let collaborators = Collaborators::system(&config.manager)?;
        Self::with_collaborators(config, collaborators)
    }

    /// Open a session with explicit collaborators and build the first
    /// inventory.
    pub fn with_collaborators(
        config: AppConfig,
        collaborators: Collaborators,
    ) -> Result<Self, AppError> {
        let inventory = Self::build_inventory(&config, &collaborators)?;
        Ok(Self {
            config,
            collaborators,
            inventory,
        })
    }

    fn build_inventory(
        config: &AppConfig,
        collaborators: &Collaborators,
    ) -> Result<Inventory, AppError> {
        let inspector = collaborators.inspector.as_ref();
        let catalog = &config.catalog;

        let policy = GlobalPolicy::probe(
            inspector,
            &PolicyInputs {
                check_for_updates: config.check_for_updates,
                latest_client_version: catalog.latest_client_version.as_deref(),
                client_version: CLIENT_VERSION,
            },
        );
        let installed = detect_installed(inspector);
        let inventory = build_tree(installed, catalog.available_packages(), catalog, &policy)?;

        for warning in &inventory.warnings {
            warn!("{}", warning);
        }
        if let Some(fatal) = &inventory.fatal {
            warn!(reason = %fatal, "Session blocked");
        }
        Ok(inventory)
    }

    /// Rebuild the inventory from scratch. Pending selections are lost.
    pub fn refresh_inventory(&mut self) -> Result<(), AppError> {
        self.inventory = Self::build_inventory(&self.config, &self.collaborators)?;
        Ok(())
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    pub fn inventory(&self) -> &Inventory {
        &self.inventory
    }

    pub fn policy(&self) -> &GlobalPolicy {
        &self.inventory.policy
    }

    /// Every package in tree order, root excluded.
    pub fn packages(&self) -> Vec<PackageView> {
        let tree = &self.inventory.tree;
        tree.iter()
            .map(|(id, pkg)| PackageView::new(id, tree.parent(id), pkg))
            .collect()
    }

    /// Everything a front end shows about the session.
    pub fn status(&self) -> StatusReport {
        StatusReport {
            client_version: CLIENT_VERSION.to_string(),
            latest_libreoffice: self.config.catalog.latest_libreoffice.clone(),
            packages: self.packages(),
            advisories: self.inventory.policy.advisories.clone(),
            fatal: self.inventory.fatal.clone(),
            warnings: self.inventory.warnings.clone(),
            planned: self.planned_changes(),
        }
    }

    fn ensure_not_blocked(&self) -> Result<(), AppError> {
        match &self.inventory.fatal {
            Some(reason) => Err(AppError::Blocked(reason.clone())),
            None => Ok(()),
        }
    }

    fn ensure_option(&self, id: usize, operation: Operation) -> Result<NodeId, AppError> {
        self.ensure_not_blocked()?;
        let node = NodeId(id);
        let pkg = self
            .inventory
            .tree
            .get(node)
            .ok_or_else(|| AppError::NotAllowed(format!("no package with id {}", id)))?;

        let flags = &pkg.flags;
        let (visible, enabled, what) = match operation {
            Operation::Install => (flags.install_visible, flags.install_enabled, "installed"),
            Operation::Removal => (flags.remove_visible, flags.remove_enabled, "removed"),
        };
        if !visible || !enabled {
            return Err(AppError::NotAllowed(format!(
                "{} cannot be {} right now",
                pkg.label(),
                what
            )));
        }
        Ok(node)
    }

    /// Mark or unmark package `id` for install.
    pub fn request_install(&mut self, id: usize, mark: bool) -> Result<(), AppError> {
        let node = self.ensure_option(id, Operation::Install)?;
        let catalog = &self.config.catalog;
        let ctx = SelectionContext {
            latest_libreoffice: &catalog.latest_libreoffice,
            latest_clipart: &catalog.latest_clipart,
            policy: &self.inventory.policy,
        };
        selection::request_install(&mut self.inventory.tree, node, mark, &ctx)?;
        Ok(())
    }

    /// Mark or unmark package `id` for removal.
    pub fn request_removal(&mut self, id: usize, mark: bool) -> Result<(), AppError> {
        let node = self.ensure_option(id, Operation::Removal)?;
        let catalog = &self.config.catalog;
        let ctx = SelectionContext {
            latest_libreoffice: &catalog.latest_libreoffice,
            latest_clipart: &catalog.latest_clipart,
            policy: &self.inventory.policy,
        };
        selection::request_removal(&mut self.inventory.tree, node, mark, &ctx)?;
        Ok(())
    }

    /// Labels and sizes of what the current selection would change.
    pub fn planned_changes(&self) -> PlannedChanges {
        ChangeSet::from_tree(&self.inventory.tree).summary()
    }

    /// Apply the current selection.
    ///
    /// With `keep_packages` the downloaded files are saved in the local-copy
    /// layout; `force_java_download` adds Java to them even when installed.
    pub fn apply_changes(
        &mut self,
        keep_packages: bool,
        force_java_download: bool,
        sink: Arc<dyn ProgressSink>,
        cancel: CancellationToken,
    ) -> Result<ProcedureReport, AppError> {
        self.ensure_not_blocked()?;
        let plan = ProcedurePlan::from_tree(
            &self.inventory.tree,
            &self.config.catalog,
            keep_packages,
            force_java_download,
        );
        info!(
            installs = plan.install_office.len(),
            removals = plan.remove_office.len(),
            keep_packages,
            "Applying changes"
        );
        self.run_and_refresh(plan, Vec::new(), sink, cancel)
    }

    /// Install whatever usable packages `dir` holds.
    pub fn install_from_local_copy(
        &mut self,
        dir: &Path,
        sink: Arc<dyn ProgressSink>,
        cancel: CancellationToken,
    ) -> Result<ProcedureReport, AppError> {
        self.ensure_not_blocked()?;
        let scan = scan_local_copy(dir)?;
        let LocalCopyPlan { plan, warnings } = plan_local_copy(&scan, &self.inventory.tree)?;
        for warning in &warnings {
            warn!("{}", warning);
        }
        info!(dir = %dir.display(), installs = plan.install_office.len(), "Installing from local copy");
        self.run_and_refresh(plan, warnings, sink, cancel)
    }

    fn run_and_refresh(
        &mut self,
        plan: ProcedurePlan,
        warnings: Vec<String>,
        sink: Arc<dyn ProgressSink>,
        cancel: CancellationToken,
    ) -> Result<ProcedureReport, AppError> {
        let result = Procedure::new(
            &self.config.manager,
            &self.collaborators,
            &self.inventory.policy,
            sink,
            cancel,
        )
        .run(plan);

        let refreshed = self.refresh_inventory();
        let mut report = result?;
        refreshed?;

        let mut all = warnings;
        all.append(&mut report.warnings);
        report.warnings = all;
        Ok(report)
    }
}
