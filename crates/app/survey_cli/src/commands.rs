use std::path::Path;
use std::sync::Arc;

use survey_core::SurveyClient;
use survey_core::config::ClientConfig;
use survey_core::courses::parse_courses;
use survey_core::models::building::BuildingNumber;
use survey_core::models::survey::SurveyForm;
use survey_core::page::{PageLoad, Screen};
use survey_core::store::{FileStore, SharedStore, default_store_path};
use survey_core::submit::{AfterSubmit, SubmitError};
use survey_core::verify::Verification;

use crate::cli::{BuildingCommand, Cli, Commands, SubmitArgs};
use crate::{Error, Result};

fn client_config(proxy: Option<&str>) -> ClientConfig {
    match proxy {
        Some(base) => {
            let page_url = ClientConfig::from_env().page_url;
            ClientConfig::for_proxy(base, &page_url)
        }
        None => ClientConfig::from_env(),
    }
}

fn open_client(cli: &Cli) -> (SurveyClient, String) {
    let path = cli.store.clone().unwrap_or_else(default_store_path);
    let shown = path.display().to_string();
    let store: SharedStore = Arc::new(FileStore::new(path));
    let client = SurveyClient::with_http(client_config(cli.proxy.as_deref()), store);
    (client, shown)
}

/// Supporter commands need a credential valid today.
fn require_supporter(client: &SurveyClient) -> Result<()> {
    if client.access().is_authenticated() {
        Ok(())
    } else {
        Err(Error::Custom(
            "Not signed in for today. Run `survey login <key>` first.".into(),
        ))
    }
}

fn yes_no(b: bool) -> &'static str {
    if b { "yes" } else { "no" }
}

pub async fn run(cli: Cli) -> Result<()> {
    if let Commands::Version = cli.command {
        println!("{} {}", env!("CARGO_PKG_NAME"), env!("CARGO_PKG_VERSION"));
        return Ok(());
    }
    if let Commands::Courses { path, filter } = &cli.command {
        return courses(path, filter.as_deref());
    }

    let (client, store_path) = open_client(&cli);
    match cli.command {
        Commands::Login { key } => {
            if client.access().attempt_login(&key).await {
                println!("Signed in until the end of the day (UTC).");
            } else {
                return Err(Error::Custom("Incorrect access code.".into()));
            }
        }
        Commands::Logout => {
            client.access().logout();
            println!("Signed out.");
        }
        Commands::Status => status(&client, &store_path),
        Commands::Building { command } => match command {
            BuildingCommand::Set { number } => {
                let b = client.preferences().select_building(number)?;
                println!("Building {b} selected.");
            }
            BuildingCommand::Clear => {
                client.preferences().clear_building();
                println!("Building cleared.");
            }
        },
        Commands::WorkshopDay { state } => {
            client.preferences().set_workshop_day(state.is_on());
            println!("Workshop day: {}", yes_no(state.is_on()));
        }
        Commands::Kiosk { state } => {
            client.preferences().set_kiosk(state.is_on());
            println!("Kiosk mode: {}", yes_no(state.is_on()));
        }
        Commands::Link => {
            require_supporter(&client)?;
            let prefs = client.preferences();
            let link = client
                .issuer()
                .issue_one_time_link(prefs.selected_building(None), prefs.workshop_day())
                .await?;
            println!("{}", link.url());
        }
        Commands::Qr {
            building,
            workshop_day,
        } => {
            // Validate before the sign-in check so range errors show first.
            let building = BuildingNumber::parse_qr_input(&building)?;
            require_supporter(&client)?;
            let url = client
                .issuer()
                .issue_signed_qr_for(building, workshop_day)
                .await?;
            println!("{url}");
        }
        Commands::Open { url } => open(&client, &url).await?,
        Commands::Submit(args) => submit(&client, args).await?,
        Commands::Courses { .. } | Commands::Version => {}
    }
    Ok(())
}

fn status(client: &SurveyClient, store_path: &str) {
    let prefs = client.preferences();
    let signed_in = client.access().is_authenticated();
    let issued = client
        .access()
        .load_credential()
        .map(|c| c.issued_date)
        .unwrap_or_else(|| "-".into());
    let building = prefs
        .selected_building(None)
        .map_or_else(|| "-".to_string(), |b| b.to_string());

    println!("store:        {store_path}");
    println!("signed in:    {} (key from {issued})", yes_no(signed_in));
    println!("building:     {building}");
    println!("workshop day: {}", yes_no(prefs.workshop_day()));
    println!("kiosk mode:   {}", yes_no(prefs.is_kiosk()));
}

async fn open(client: &SurveyClient, url: &str) -> Result<()> {
    let load = client
        .open_page(url)
        .await
        .map_err(|e| Error::Custom(format!("Invalid page URL: {e}")))?;

    let page = match load {
        PageLoad::Reset { next_url } => {
            println!("Session reset. Continue at {next_url}");
            return Ok(());
        }
        PageLoad::Ready(page) => page,
    };

    let screen = match page.screen {
        Screen::Survey => "survey",
        Screen::BuildingSelection => "building selection",
    };
    println!("screen:        {screen}");
    println!("login shown:   {}", yes_no(page.login_required));
    if let Some(b) = page.building {
        println!("building:      {b}");
    }
    println!("workshop:      {}", yes_no(page.workshop_default));
    match &page.verification {
        Verification::NoToken => {}
        Verification::Verified => println!("link:          valid"),
        Verification::VerifiedOffline => println!("link:          not checked (offline)"),
        Verification::Rejected { problem, .. } => {
            println!("link:          rejected");
            return Err(Error::Custom(format!("{}: {}", problem.title, problem.message)));
        }
    }
    Ok(())
}

async fn submit(client: &SurveyClient, args: SubmitArgs) -> Result<()> {
    let form = SurveyForm {
        role: args.role,
        student_number: args.student_number,
        username: args.username,
        satisfaction: args.satisfaction,
        course_number: args.course,
        workshop: args.workshop,
    };
    let building = client.preferences().selected_building(None);

    // A link respondent may only submit once the token has been checked.
    if let Verification::Rejected { problem, .. } =
        client.verifier().verify(args.token.as_deref()).await
    {
        return Err(Error::Custom(format!("{}: {}", problem.title, problem.message)));
    }

    match client
        .submitter()
        .submit(&form, building, args.token.as_deref())
        .await
    {
        Ok(AfterSubmit::Redirect { url, .. }) => {
            println!("Thank you! Continue at {url}");
            Ok(())
        }
        Ok(AfterSubmit::ResetForm { .. }) => {
            println!("Thank you! Ready for the next response.");
            Ok(())
        }
        Err(e @ SubmitError::Invalid(_)) => Err(e.into()),
        Err(e) => {
            if let Some(problem) = e.problem() {
                println!("{}", problem.title);
                println!("{}", problem.message);
            }
            Err(e.into())
        }
    }
}

fn courses(path: &Path, filter: Option<&str>) -> Result<()> {
    let raw = std::fs::read_to_string(path)?;
    let needle = filter.map(str::to_lowercase);
    for course in parse_courses(&raw) {
        let label = course.label();
        if needle
            .as_deref()
            .is_none_or(|n| label.to_lowercase().contains(n))
        {
            println!("{label}");
        }
    }
    Ok(())
}
