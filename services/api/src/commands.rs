use crate::cli::{
    AdminCommand, CategoryCommand, ExportArgs, FilterArgs, PanchayathCommand, RegisterArgs,
    ReviewArgs,
};
use crate::infra::Workspace;
use elife_registry::catalog::{
    CategoryDraft, CategoryId, CategoryListing, PanchayathDraft, PanchayathId,
};
use elife_registry::error::AppError;
use elife_registry::registrations::{
    Registration, RegistrationFilter, RegistrationId, RegistrationServiceError,
    RegistrationSubmission,
};
use std::io::Write;

pub(crate) fn run(command: AdminCommand) -> Result<(), AppError> {
    let mut workspace = Workspace::open()?;
    let stdout = std::io::stdout();
    let mut out = stdout.lock();
    execute(&mut workspace, command, &mut out)
}

/// Runs one admin command. Mutations reach the snapshot before this returns.
pub(crate) fn execute(
    workspace: &mut Workspace,
    command: AdminCommand,
    out: &mut dyn Write,
) -> Result<(), AppError> {
    match command {
        AdminCommand::Register(args) => register(workspace, args, out),
        AdminCommand::Status { token } => status(workspace, &token, out),
        AdminCommand::Login { username, role } => {
            let session = workspace.session.login(&username, role)?;
            writeln!(out, "logged in as {} ({})", session.username, session.role)?;
            Ok(())
        }
        AdminCommand::Logout => {
            workspace.session.logout()?;
            writeln!(out, "logged out")?;
            Ok(())
        }
        AdminCommand::Whoami => {
            match workspace.actor() {
                Some(session) => writeln!(out, "{} ({})", session.username, session.role)?,
                None => writeln!(out, "not logged in")?,
            }
            Ok(())
        }
        AdminCommand::List(args) => list(workspace, args, out),
        AdminCommand::Review(args) => review(workspace, args, out),
        AdminCommand::Recategorize { id, category } => {
            let updated = workspace.registry.registrations.correct_category(
                workspace.actor(),
                &RegistrationId(id),
                &category,
            )?;
            writeln!(out, "{} moved to {}", updated.customer_id, updated.category)?;
            Ok(())
        }
        AdminCommand::History { id } => {
            let entries = workspace
                .registry
                .registrations
                .review_history(workspace.actor(), &RegistrationId(id))?;
            if entries.is_empty() {
                writeln!(out, "no reviews recorded")?;
            }
            for entry in entries {
                writeln!(
                    out,
                    "{}  {:<7} {} -> {}  by {} ({}){}",
                    entry.at.format("%Y-%m-%d %H:%M:%S"),
                    entry.action.label(),
                    entry.from,
                    entry.to,
                    entry.actor,
                    entry.actor_role,
                    entry
                        .reason
                        .as_deref()
                        .map(|reason| format!(": {reason}"))
                        .unwrap_or_default()
                )?;
            }
            Ok(())
        }
        AdminCommand::Export(args) => export(workspace, args, out),
        AdminCommand::Category { command } => category(workspace, command, out),
        AdminCommand::Panchayath { command } => panchayath(workspace, command, out),
        AdminCommand::Dashboard => {
            let stats = workspace.registry.dashboard.stats(workspace.actor())?;
            writeln!(out, "registrations  {}", stats.total)?;
            writeln!(out, "  pending      {}", stats.pending)?;
            writeln!(out, "  approved     {}", stats.approved)?;
            writeln!(out, "  rejected     {}", stats.rejected)?;
            writeln!(out, "categories     {}", stats.categories)?;
            writeln!(out, "panchayaths    {}", stats.panchayaths)?;
            Ok(())
        }
    }
}

fn register(workspace: &Workspace, args: RegisterArgs, out: &mut dyn Write) -> Result<(), AppError> {
    let submission = RegistrationSubmission {
        category: args.category,
        name: args.name,
        address: args.address,
        mobile_number: args.mobile,
        panchayath: args.panchayath,
        ward: args.ward,
        agent_pro: args.agent_pro,
    };
    let record = workspace.registry.registrations.submit(submission)?;
    writeln!(
        out,
        "registered {} with customer id {} ({})",
        record.name, record.customer_id, record.status
    )?;
    Ok(())
}

fn status(workspace: &Workspace, token: &str, out: &mut dyn Write) -> Result<(), AppError> {
    match workspace.registry.registrations.check_status(token) {
        Ok(record) => {
            let view = record.status_view();
            writeln!(out, "customer id  {}", view.customer_id)?;
            writeln!(out, "name         {}", view.name)?;
            writeln!(out, "category     {}", view.category)?;
            writeln!(out, "panchayath   {} (ward {})", view.panchayath, view.ward)?;
            writeln!(out, "status       {}", view.status)?;
            writeln!(out, "applied on   {}", view.applied_on.format("%Y-%m-%d"))?;
            Ok(())
        }
        Err(RegistrationServiceError::NotFound) => {
            writeln!(out, "no registration found for {}", token.trim())?;
            Ok(())
        }
        Err(err) => Err(err.into()),
    }
}

fn filter_from(args: FilterArgs) -> Result<RegistrationFilter, AppError> {
    RegistrationFilter::from_params(args.category, args.panchayath, args.status)
        .map_err(|err| RegistrationServiceError::from(err).into())
}

fn list(workspace: &Workspace, args: FilterArgs, out: &mut dyn Write) -> Result<(), AppError> {
    let filter = filter_from(args)?;
    let snapshot = workspace.registry.registrations.snapshot(workspace.actor())?;
    let records = snapshot.filter(&filter);
    for record in &records {
        write_row(out, record)?;
    }
    writeln!(out, "{} of {} registration(s)", records.len(), snapshot.len())?;
    Ok(())
}

fn write_row(out: &mut dyn Write, record: &Registration) -> std::io::Result<()> {
    writeln!(
        out,
        "{}  {}  {:<20} {:<12} {:<12} {}",
        record.id,
        record.customer_id,
        record.name,
        record.category,
        record.panchayath,
        record.status
    )
}

fn review(workspace: &Workspace, args: ReviewArgs, out: &mut dyn Write) -> Result<(), AppError> {
    let updated = workspace.registry.registrations.review(
        workspace.actor(),
        &RegistrationId(args.id),
        args.verb.into(),
        args.reason,
    )?;
    writeln!(out, "{} is now {}", updated.customer_id, updated.status)?;
    Ok(())
}

fn export(workspace: &Workspace, args: ExportArgs, out: &mut dyn Write) -> Result<(), AppError> {
    let filter = filter_from(args.filter)?;
    let directory = args
        .dir
        .unwrap_or_else(|| workspace.config.export.directory.clone());
    let table = workspace
        .registry
        .registrations
        .export(workspace.actor(), &filter)?;
    let path = table.write_to_dir(&directory)?;
    writeln!(out, "exported {} row(s) to {}", table.rows().len(), path.display())?;
    Ok(())
}

fn category(
    workspace: &Workspace,
    command: CategoryCommand,
    out: &mut dyn Write,
) -> Result<(), AppError> {
    let catalog = &workspace.registry.catalog;
    match command {
        CategoryCommand::List { all } => {
            let categories = if all {
                catalog.all_categories(workspace.actor())?
            } else {
                catalog.active_categories()?
            };
            for category in categories.into_iter().map(CategoryListing::from) {
                let pricing = match (category.is_free, category.discount) {
                    (true, _) => "  free".to_string(),
                    (false, Some(saving)) => format!("  saves {saving}"),
                    (false, None) => String::new(),
                };
                let listed = &category.category;
                writeln!(
                    out,
                    "{}  {:<12} fee {} offer {}{}{}",
                    listed.id,
                    listed.name,
                    listed.actual_fee,
                    listed.offer_fee,
                    pricing,
                    if listed.is_active { "" } else { "  (inactive)" }
                )?;
            }
        }
        CategoryCommand::Add {
            name,
            description,
            actual_fee,
            offer_fee,
            inactive,
        } => {
            let created = catalog.create_category(
                workspace.actor(),
                CategoryDraft {
                    name,
                    description,
                    actual_fee,
                    offer_fee,
                    image_url: None,
                    popup_image_url: None,
                    is_active: !inactive,
                },
            )?;
            writeln!(out, "created category {} ({})", created.name, created.id)?;
        }
        CategoryCommand::Toggle { id } => {
            let toggled = catalog.toggle_category(workspace.actor(), &CategoryId(id))?;
            let state = if toggled.is_active { "active" } else { "inactive" };
            writeln!(out, "{} is now {}", toggled.name, state)?;
        }
    }
    Ok(())
}

fn panchayath(
    workspace: &Workspace,
    command: PanchayathCommand,
    out: &mut dyn Write,
) -> Result<(), AppError> {
    let catalog = &workspace.registry.catalog;
    match command {
        PanchayathCommand::List => {
            for panchayath in catalog.panchayaths()? {
                writeln!(out, "{}  {} ({})", panchayath.id, panchayath.name, panchayath.district)?;
            }
        }
        PanchayathCommand::Add { name, district } => {
            let created =
                catalog.create_panchayath(workspace.actor(), PanchayathDraft { name, district })?;
            writeln!(out, "created panchayath {} ({})", created.name, created.id)?;
        }
        PanchayathCommand::Remove { id } => {
            catalog.delete_panchayath(workspace.actor(), &PanchayathId(id))?;
            writeln!(out, "removed panchayath")?;
        }
    }
    Ok(())
}
