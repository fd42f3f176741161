use crate::infra::Registry;
use clap::Args;
use elife_registry::access::{AdminRole, AdminSession};
use elife_registry::catalog::{CategoryDraft, PanchayathDraft};
use elife_registry::config::ExportConfig;
use elife_registry::dashboard::DashboardStats;
use elife_registry::error::AppError;
use elife_registry::registrations::{
    RegistrationFilter, RegistrationServiceError, RegistrationStatus, RegistrationSubmission,
};
use elife_registry::store::InMemoryStore;
use std::path::PathBuf;

const DEMO_CATEGORIES: [(&str, &str, u32, u32); 5] = [
    ("FarmeLife", "Agriculture and allied livelihoods", 500, 250),
    ("FoodeLife", "Home food and catering units", 500, 250),
    ("OrganeLife", "Organic produce networks", 500, 0),
    ("EntreLife", "Small enterprise support", 1000, 500),
    ("Job Card", "Employment registration", 0, 0),
];

const DEMO_PANCHAYATHS: [(&str, &str); 2] = [("Kadavoor", "Ernakulam"), ("Piravom", "Ernakulam")];

#[derive(Args, Debug, Default)]
pub(crate) struct DemoArgs {
    /// Write the demo's registration export into this directory.
    #[arg(long)]
    pub(crate) export_dir: Option<PathBuf>,
}

/// What the scripted walkthrough observed at each step.
#[derive(Debug)]
pub(crate) struct DemoSummary {
    pub(crate) customer_id: String,
    pub(crate) duplicate_refused: bool,
    pub(crate) user_admin_refused: bool,
    pub(crate) final_status: RegistrationStatus,
    pub(crate) dashboard: DashboardStats,
    pub(crate) export_path: Option<PathBuf>,
}

pub(crate) fn run_demo(args: DemoArgs) -> Result<(), AppError> {
    println!("E-Life registration walkthrough");
    let summary = walkthrough(args.export_dir)?;

    println!("\nSummary");
    println!("  customer id ............. {}", summary.customer_id);
    println!(
        "  duplicate refused ....... {}",
        yes_no(summary.duplicate_refused)
    );
    println!(
        "  user admin refused ...... {}",
        yes_no(summary.user_admin_refused)
    );
    println!("  final status ............ {}", summary.final_status);
    println!(
        "  dashboard ............... total {} / pending {} / approved {} / rejected {}",
        summary.dashboard.total,
        summary.dashboard.pending,
        summary.dashboard.approved,
        summary.dashboard.rejected
    );
    if let Some(path) = &summary.export_path {
        println!("  export .................. {}", path.display());
    }
    Ok(())
}

/// Runs the intake and review scenario against a fresh in-memory registry.
pub(crate) fn walkthrough(export_dir: Option<PathBuf>) -> Result<DemoSummary, AppError> {
    let registry = Registry::new(InMemoryStore::new(), ExportConfig::default());
    let local_admin = AdminSession::new("meera", AdminRole::LocalAdmin);
    let user_admin = AdminSession::new("ravi", AdminRole::UserAdmin);
    let super_admin = AdminSession::new("director", AdminRole::SuperAdmin);

    for (name, description, actual_fee, offer_fee) in DEMO_CATEGORIES {
        registry.catalog.create_category(
            Some(&local_admin),
            CategoryDraft {
                name: name.to_string(),
                description: description.to_string(),
                actual_fee,
                offer_fee,
                image_url: None,
                popup_image_url: None,
                is_active: true,
            },
        )?;
    }
    for (name, district) in DEMO_PANCHAYATHS {
        registry.catalog.create_panchayath(
            Some(&local_admin),
            PanchayathDraft {
                name: name.to_string(),
                district: district.to_string(),
            },
        )?;
    }
    println!(
        "\n1. Catalog seeded with {} categories and {} panchayaths",
        DEMO_CATEGORIES.len(),
        DEMO_PANCHAYATHS.len()
    );

    let submission = RegistrationSubmission {
        category: "FarmeLife".to_string(),
        name: "Asha".to_string(),
        address: "X".to_string(),
        mobile_number: "9876543210".to_string(),
        panchayath: "Kadavoor".to_string(),
        ward: "3".to_string(),
        agent_pro: None,
    };

    let record = registry.registrations.submit(submission.clone())?;
    println!(
        "2. Asha registered as {} ({})",
        record.customer_id, record.status
    );

    let duplicate_refused = match registry.registrations.submit(submission) {
        Err(RegistrationServiceError::Duplicate) => true,
        Err(err) => return Err(err.into()),
        Ok(_) => false,
    };
    println!(
        "3. Second submission with the same mobile number refused: {}",
        yes_no(duplicate_refused)
    );

    let user_admin_refused = match registry
        .registrations
        .approve(Some(&user_admin), &record.id)
    {
        Err(RegistrationServiceError::Unauthorized(denied)) => {
            println!(
                "4. ravi (user_admin) cannot approve, redirected to {}",
                denied.redirect_target()
            );
            true
        }
        Err(err) => return Err(err.into()),
        Ok(_) => false,
    };

    let approved = registry
        .registrations
        .approve(Some(&local_admin), &record.id)?;
    println!("5. meera (local_admin) approved {}", approved.customer_id);

    let checked = registry.registrations.check_status("9876543210")?;
    println!("6. Status check by mobile number: {}", checked.status);

    let dashboard = registry.dashboard.stats(Some(&super_admin))?;
    println!(
        "7. Dashboard shows {} registration(s), {} approved",
        dashboard.total, dashboard.approved
    );

    let export_path = match export_dir {
        Some(directory) => {
            let table = registry
                .registrations
                .export(Some(&local_admin), &RegistrationFilter::all())?;
            let path = table.write_to_dir(&directory)?;
            println!("8. Exported {} row(s) to {}", table.rows().len(), path.display());
            Some(path)
        }
        None => None,
    };

    Ok(DemoSummary {
        customer_id: record.customer_id.as_str().to_string(),
        duplicate_refused,
        user_admin_refused,
        final_status: checked.status,
        dashboard,
        export_path,
    })
}

fn yes_no(flag: bool) -> &'static str {
    if flag {
        "yes"
    } else {
        "no"
    }
}
