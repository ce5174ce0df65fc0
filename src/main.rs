use std::process::ExitCode;
use std::time::Instant;

use chrono::{Local, NaiveDate, Utc};
use clap::Parser;
use presences::{
    AppState,
    cli::{Cli, Command, QrAction},
    config::Config,
    error::{AppError, AppResult},
    navigation::{self, Route},
    qr::{PlageSelection, TEACHER_ONLY_MESSAGE},
    scan::{ScanEvent, ScanFlow, StepUp},
    schedule::run_background_sync,
    schedule::week::{seances_for_date, shift_week, week_with_data},
    utils::{format_date_long, format_date_short, format_time_range},
};
use tokio::io::{AsyncBufReadExt, BufReader, Lines, Stdin};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info".into()),
        ))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    dotenv::dotenv().ok();
    let cli = Cli::parse();

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Erreur: {}", e);
            ExitCode::from(e.exit_code() as u8)
        }
    }
}

async fn run(cli: Cli) -> AppResult<()> {
    let api_url = cli.api_url.clone();
    let data_dir = cli.data_dir.clone();
    let config = Config::from_lookup(|key| match key {
        "PRESENCES_API_URL" => api_url.clone().or_else(|| std::env::var(key).ok()),
        "PRESENCES_DATA_DIR" => data_dir
            .as_ref()
            .map(|d| d.to_string_lossy().into_owned())
            .or_else(|| std::env::var(key).ok()),
        _ => std::env::var(key).ok(),
    })?;
    tracing::debug!("using API at {}", config.api_base_url);

    let state = AppState::init(config).await?;
    let result = dispatch(&state, cli.command).await;
    state.store.close().await;
    result
}

async fn dispatch(state: &AppState, command: Command) -> AppResult<()> {
    let mut stdin = BufReader::new(tokio::io::stdin()).lines();

    match command {
        Command::Login { email, password } => {
            let password = match password {
                Some(password) => password,
                None => prompt(&mut stdin, "Mot de passe: ").await?,
            };
            let session = state.session.sign_in(&email, &password).await?;
            match &session.user {
                Some(user) => println!("Connecté: {} ({})", user.display_name(), user.role.as_str()),
                None => println!("Connecté: {}", email),
            }
            let token = session.auth_token.as_deref();
            if !state.schedule.refresh(token).await? {
                println!("Emploi du temps hors ligne (données locales)");
            }
        }
        Command::Logout => {
            state.session.sign_out().await?;
            println!("Déconnecté");
        }
        Command::Whoami => match state.session.user().await {
            Some(user) if state.session.is_signed_in().await => {
                println!("{}", user.display_name());
                println!("email: {}", user.email);
                println!("rôle: {}", user.role.as_str());
                if let Some(id) = user.id_utilisateur {
                    println!("id: {}", id);
                }
                println!(
                    "biométrie: {}",
                    if state.session.biometric_enabled().await? { "activée" } else { "désactivée" }
                );
            }
            _ => println!("Non connecté"),
        },
        Command::NotifyKey { key } => {
            state.session.update_notification_key(&key).await?;
            println!("Clé de notification enregistrée");
        }
        Command::Biometric { state: toggle } => {
            state.session.set_biometric_enabled(toggle == "on").await?;
            println!("Biométrie {}", if toggle == "on" { "activée" } else { "désactivée" });
        }
        Command::Schedule {
            date,
            week,
            refresh,
        } => {
            require_route(state, Route::Home).await?;
            if refresh {
                let token = state.session.token().await;
                state.schedule.refresh(token.as_deref()).await?;
            }
            print_week(state, shift_week(date.unwrap_or_else(today), week)?).await?;
        }
        Command::Today => {
            require_route(state, Route::Home).await?;
            let seances = state.schedule.today_snapshot().await?;
            println!("{}", format_date_short(today()));
            if seances.is_empty() {
                println!("Aucun cours aujourd'hui");
            }
            for seance in seances {
                println!(
                    "  {}-{} {}",
                    seance.start_time(),
                    seance.end_time(),
                    seance.course_name()
                );
            }
        }
        Command::Sync { watch: false } => {
            let token = state.session.token().await;
            let count = run_background_sync(&state.api, &state.store, token.as_deref()).await?;
            println!("{} séances synchronisées", count);
        }
        Command::Sync { watch: true } => {
            let token = state.session.token().await;
            if !state.schedule.refresh(token.as_deref()).await? {
                println!("Serveur injoignable, données locales conservées");
            }
            let handle = state.sync_scheduler().start();
            tokio::signal::ctrl_c().await?;
            handle.stop().await;
        }
        Command::Scan { password } => scan(state, &mut stdin, password).await?,
        Command::Qr { action } => qr(state, action).await?,
        Command::Roster { date } => {
            require_route(state, Route::ListEmarger).await?;
            let day = date.unwrap_or_else(today);
            let rosters = state.roster().for_day(day).await?;
            if rosters.is_empty() {
                println!("Aucune séance le {}", format_date_long(day));
            }
            for roster in rosters {
                println!(
                    "{} {} ({}/{} émargés)",
                    roster.seance.course_name(),
                    format_time_range(&roster.seance.heure_debut, &roster.seance.heure_fin),
                    roster.present_count(),
                    roster.entries.len()
                );
                for entry in roster.entries {
                    println!(
                        "  [{}] {} - {}",
                        if entry.emarge { "x" } else { " " },
                        entry.student.full_name(),
                        entry.student.formation()
                    );
                }
            }
        }
        Command::Report { out, html } => {
            require_route(state, Route::Profile).await?;
            let reports = state.reports(html, out);
            let records = reports.fetch_records().await?;
            let file = reports.generate_report(&records).await?;
            println!("{}", file.display());
        }
        Command::Open { payload } => {
            let data: serde_json::Value = serde_json::from_str(&payload)?;
            let session = state.session.current().await;
            match navigation::from_notification(&data) {
                Some(route) => println!("{}", navigation::resolve(route, &session).path()),
                None => println!("{}", navigation::resolve(Route::Home, &session).path()),
            }
        }
    }
    Ok(())
}

fn today() -> NaiveDate {
    Local::now().date_naive()
}

async fn require_route(state: &AppState, route: Route) -> AppResult<()> {
    let session = state.session.current().await;
    let wanted = route.path();
    let resolved = navigation::resolve(route, &session);
    match resolved {
        Route::Login => Err(AppError::NotSignedIn),
        other if other.path() != wanted => Err(AppError::Forbidden(TEACHER_ONLY_MESSAGE.to_string())),
        _ => Ok(()),
    }
}

async fn prompt(stdin: &mut Lines<BufReader<Stdin>>, label: &str) -> AppResult<String> {
    eprint!("{}", label);
    Ok(stdin.next_line().await?.unwrap_or_default().trim().to_string())
}

async fn print_week(state: &AppState, day: NaiveDate) -> AppResult<()> {
    let seances = state.schedule.seances().await;
    if let Some(last) = state.schedule.last_sync().await? {
        println!("Dernière synchronisation: {}", last);
    }
    for week_day in week_with_data(&seances, day, today()) {
        println!("{} {} ({})", week_day.day_name, week_day.label, week_day.seance_count);
        for seance in seances_for_date(&seances, week_day.date) {
            println!(
                "  {} {} - {}",
                format_time_range(&seance.heure_debut, &seance.heure_fin),
                seance.course_name(),
                seance.teacher_name()
            );
        }
    }
    Ok(())
}

async fn scan(
    state: &AppState,
    stdin: &mut Lines<BufReader<Stdin>>,
    password: Option<String>,
) -> AppResult<()> {
    require_route(state, Route::Camera).await?;
    let confirmer = state.confirmer();
    let mut flow = ScanFlow::new(state.config.scan_cooldown());
    flow.open_camera();
    eprintln!("Scannez un QR code (une ligne par image)");

    while let Some(frame) = stdin.next_line().await? {
        let route = match flow.on_barcode(frame.trim(), Instant::now()) {
            ScanEvent::Ignored => continue,
            ScanEvent::Rejected(message) => {
                eprintln!("{}", message);
                if let Some(at) = flow.retry_at() {
                    tokio::time::sleep_until(at.into()).await;
                    flow.tick(Instant::now());
                }
                continue;
            }
            ScanEvent::Accepted(route) => route,
        };
        flow.begin_authentication()?;
        let details = confirmer.course_details(&route.payload).await;
        println!("{} - {}", details.course_name, details.plage_label());
        println!("{}", details.time_slot);

        let password = match &password {
            Some(password) => password.clone(),
            None => prompt(stdin, "Mot de passe: ").await?,
        };
        let confirmation = confirmer
            .confirm(&mut flow, StepUp::Password(&password), &details)
            .await?;
        println!("{}", confirmation.message);
        println!("{} ({})", confirmation.course_name, confirmation.time_slot);
        return Ok(());
    }
    flow.cancel();
    eprintln!("Scan abandonné: aucun QR code valide lu");
    Ok(())
}

async fn qr(state: &AppState, action: QrAction) -> AppResult<()> {
    require_route(state, Route::QrCode).await?;
    let generator = state.qr_generator();
    match action {
        QrAction::Sessions { date } => {
            let day = date.unwrap_or_else(today);
            let seances = generator.teacher_sessions(day).await?;
            if seances.is_empty() {
                println!("Aucune séance le {}", format_date_long(day));
            }
            for seance in seances {
                println!(
                    "{}  {} {}",
                    seance.id_seance,
                    format_time_range(&seance.heure_debut, &seance.heure_fin),
                    seance.course_name()
                );
            }
        }
        QrAction::Plages { seance } => {
            for plage in generator.plages(seance).await? {
                println!("{}  {} (id {})", plage.number, plage.time_range(), plage.plage.id_plage);
            }
        }
        QrAction::Generate {
            seance,
            plage,
            duration,
        } => {
            let selection = plage.map_or(PlageSelection::Full, PlageSelection::Plage);
            let duration = duration.unwrap_or(state.config.qr_duration_mins);
            let qr = generator.generate(seance, selection, duration).await?;
            println!("{}", qr.qr_data);
            println!("Expire à {}", qr.expires_at.with_timezone(&Local).format("%H:%M:%S"));
            println!("{}", qr.countdown_label(Utc::now()));
        }
    }
    Ok(())
}
