//! `lomanager status`: the package tree and what blocks changes.

use console::style;
use lomanager::app::{AppConfig, PackageView, StatusReport};
use lomanager::config::format_size;

use super::{open_session, print_json, print_plan};
use crate::error::CliError;

/// Run the status command.
pub fn run(config: AppConfig, json: bool) -> Result<(), CliError> {
    let session = open_session(config)?;
    let status = session.status();

    if json {
        return print_json(&status);
    }
    print_status(&status);
    Ok(())
}

fn print_status(status: &StatusReport) {
    println!(
        "lomanager {} (recommended LibreOffice {})",
        status.client_version, status.latest_libreoffice
    );
    println!();

    if let Some(reason) = &status.fatal {
        println!("{} {}", style("Blocked:").red().bold(), reason);
        println!();
    }
    for advisory in &status.advisories {
        println!("{} {}", style("Note:").yellow(), advisory);
    }
    if !status.advisories.is_empty() {
        println!();
    }

    println!(
        "{:>4}  {:<44} {:<10} {:>10}  {}",
        style("ID").bold(),
        style("Package").bold(),
        style("State").bold(),
        style("Size").bold(),
        style("Options").bold()
    );
    for pkg in &status.packages {
        println!("{}", package_line(pkg));
    }

    if !status.planned.to_install.is_empty() || !status.planned.to_remove.is_empty() {
        println!();
        print_plan(&status.planned);
    }
}

fn package_line(pkg: &PackageView) -> String {
    let indent = if pkg.parent.is_some() { "  " } else { "" };
    let name = format!("{}{}", indent, display_name(pkg));
    let state = if pkg.installed {
        style(format!("{:<10}", "installed")).green()
    } else {
        style(format!("{:<10}", "available")).dim()
    };
    let size = if pkg.size > 0 {
        format_size(pkg.size)
    } else {
        String::new()
    };
    format!(
        "{:>4}  {:<44} {} {:>10}  {}",
        pkg.id,
        name,
        state,
        size,
        options(pkg)
    )
}

/// Label of a package inside the tree. Language packs sit under their
/// core, so the family and version are left out.
fn display_name(pkg: &PackageView) -> String {
    if pkg.parent.is_some() && pkg.kind != "core-packages" {
        format!("language pack {}", pkg.kind)
    } else {
        format!("{} {}", pkg.family, pkg.version)
    }
}

/// What can be done with the package, and what is already marked.
fn options(pkg: &PackageView) -> String {
    let flags = &pkg.flags;
    let mut parts = Vec::new();
    if flags.marked_for_install {
        parts.push("[marked: install]".to_string());
    } else if flags.install_visible && flags.install_enabled {
        parts.push("install".to_string());
    }
    if flags.marked_for_removal {
        parts.push("[marked: remove]".to_string());
    } else if flags.remove_visible && flags.remove_enabled {
        parts.push("remove".to_string());
    }
    parts.join(", ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use lomanager::package::{Family, PackageFlags};

    fn view(parent: Option<usize>, kind: &str, installed: bool, flags: PackageFlags) -> PackageView {
        PackageView {
            id: 3,
            parent,
            family: Family::LibreOffice,
            kind: kind.to_string(),
            version: "7.6.4.1".to_string(),
            label: format!("LibreOffice 7.6.4.1 {}", kind),
            installed,
            size: 0,
            flags,
        }
    }

    #[test]
    fn test_display_name() {
        let core = view(None, "core-packages", true, PackageFlags::default());
        assert_eq!(display_name(&core), "LibreOffice 7.6.4.1");

        let lang = view(Some(2), "fr", false, PackageFlags::default());
        assert_eq!(display_name(&lang), "language pack fr");
    }

    #[test]
    fn test_options_show_marks_and_enabled_choices() {
        let flags = PackageFlags {
            remove_visible: true,
            remove_enabled: true,
            install_visible: true,
            install_enabled: false,
            ..Default::default()
        };
        assert_eq!(options(&view(None, "core-packages", true, flags)), "remove");

        let flags = PackageFlags {
            install_visible: true,
            install_enabled: true,
            marked_for_install: true,
            ..Default::default()
        };
        assert_eq!(options(&view(None, "core-packages", false, flags)), "[marked: install]");
    }
}
