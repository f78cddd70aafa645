//!
//! mudsec_audit
//! ------------
//! Answers one authorization question against a saved world: loads a world
//! snapshot (JSON) and an optional security config, builds the security
//! engine over it and prints whether the requester may perform the operation.
//! Exit status is 0 when allowed and 4 when denied; other failures use the
//! codes from `AppError::exit_code`.

use std::env;
use std::path::PathBuf;
use std::sync::Arc;

use tracing::info;
use tracing_subscriber::{fmt, EnvFilter};

use mudsec::config::SecurityConfig;
use mudsec::dbinterface::Database;
use mudsec::dbtype::{EntityField, EntityId, EntityType};
use mudsec::error::{AppError, AppResult};
use mudsec::events::EventBus;
use mudsec::security::{Context, Operation, SecurityAccess};

fn print_usage(program: &str) {
    eprintln!(
        "Usage:\n  {program} --world <snapshot.json> --requester <site-id> --op <operation> [options]\n\nOptions:\n  --config <security.json>   security config (defaults when missing)\n  --program <site-id>        program acting for the requester\n  --run-as                   program runs with the requester's rights\n  --target <site-id>         target entity (destination for transfer_entity)\n  --source <site-id>         second entity (entity being moved for transfer_entity)\n  --app <name|/path>         application scope\n  --field <field>            entity field scope\n  --type <entity_type>       entity type (create_entity)\n  --json                     print the verdict as JSON\n\nExamples:\n  {program} --world world.json --requester 2-5 --op get_entity_field --target 2-9 --field note\n  {program} --world world.json --requester 2-5 --op transfer_entity --target 2-3 --source 2-9"
    );
}

#[derive(Default)]
struct Args {
    world: Option<PathBuf>,
    config: Option<PathBuf>,
    requester: Option<EntityId>,
    program: EntityId,
    run_as: bool,
    op: Option<Operation>,
    target: Option<EntityId>,
    source: Option<EntityId>,
    app: Option<String>,
    field: Option<EntityField>,
    entity_type: Option<EntityType>,
    json: bool,
}

fn parse_value<T: std::str::FromStr>(flag: &str, value: Option<&String>) -> AppResult<T>
where
    T::Err: std::fmt::Display,
{
    let v = value.ok_or_else(|| AppError::user("missing_value".to_string(), format!("{} requires a value", flag)))?;
    v.parse::<T>().map_err(|e| AppError::user("bad_value".to_string(), format!("{} '{}': {}", flag, v, e)))
}

fn parse_args(args: &[String]) -> AppResult<Args> {
    let mut out = Args::default();
    let mut i = 0;
    while i < args.len() {
        let flag = args[i].as_str();
        let value = args.get(i + 1);
        match flag {
            "--world" => out.world = Some(parse_value(flag, value)?),
            "--config" => out.config = Some(parse_value(flag, value)?),
            "--requester" => out.requester = Some(parse_value(flag, value)?),
            "--program" => out.program = parse_value(flag, value)?,
            "--op" => out.op = Some(parse_value(flag, value)?),
            "--target" => out.target = Some(parse_value(flag, value)?),
            "--source" => out.source = Some(parse_value(flag, value)?),
            "--app" => out.app = Some(parse_value(flag, value)?),
            "--field" => out.field = Some(parse_value(flag, value)?),
            "--type" => out.entity_type = Some(parse_value(flag, value)?),
            "--run-as" => { out.run_as = true; i += 1; continue; }
            "--json" => { out.json = true; i += 1; continue; }
            other => return Err(AppError::user("unknown_flag".to_string(), format!("unknown argument '{}'", other))),
        }
        i += 2;
    }
    Ok(out)
}

fn run(args: Args) -> AppResult<bool> {
    let world = args.world.ok_or_else(|| AppError::user("missing_world", "--world is required"))?;
    let requester = args.requester.ok_or_else(|| AppError::user("missing_requester", "--requester is required"))?;
    let op = args.op.ok_or_else(|| AppError::user("missing_op", "--op is required"))?;

    let mut config = match &args.config {
        Some(p) => SecurityConfig::load_or_default(p)?,
        None => SecurityConfig::default(),
    };
    config.apply_env_overrides()?;

    let bus = EventBus::start()?;
    let db = Arc::new(Database::with_events(bus.clone()));
    let text = std::fs::read_to_string(&world)?;
    let loaded = db.load_snapshot_json(&text)?;
    info!(target: "mudsec::audit", "loaded {} entities from {}", loaded, world.display());

    let access = SecurityAccess::new(db.clone(), config);
    let mut ctx = if args.program.is_valid() {
        Context::new(requester, args.program, args.run_as)
    } else {
        Context::for_requester(requester)
    };

    let lookup = |id: Option<EntityId>, flag: &str| -> AppResult<_> {
        let id = id.ok_or_else(|| AppError::user("missing_target".to_string(), format!("{} requires {}", op, flag)))?;
        let r = db.get(&id);
        if !r.valid() { return Err(AppError::not_found("entity_not_found".to_string(), format!("no entity {}", id))); }
        Ok(r)
    };

    let outcome = if let Some(t) = args.entity_type {
        access.security_check_entity_type(op, &mut ctx, t, true)
    } else if args.source.is_some() {
        let target = lookup(args.target, "--target")?;
        let source = lookup(args.source, "--source")?;
        access.security_check_source(op, &mut ctx, &target, &source, true)
    } else if let Some(app) = &args.app {
        let target = lookup(args.target, "--target")?;
        access.security_check_application(op, &mut ctx, &target, app, true)
    } else if let Some(field) = args.field {
        let target = lookup(args.target, "--target")?;
        access.security_check_field(op, &mut ctx, &target, field, true)
    } else if args.target.is_some() {
        let target = lookup(args.target, "--target")?;
        access.security_check_target(op, &mut ctx, &target, true)
    } else {
        access.security_check(op, &mut ctx, true)
    };

    access.shutdown();
    bus.shutdown();

    let capabilities: Vec<String> = ctx.capabilities().map(|c| c.to_string()).collect();
    match outcome {
        Ok(allowed) => {
            if args.json {
                println!("{}", serde_json::json!({"operation": op, "allowed": allowed, "capabilities": capabilities}));
            } else {
                println!("ALLOW {} (capabilities: {})", op, capabilities.join(", "));
            }
            Ok(allowed)
        }
        Err(violation) => {
            if args.json {
                println!("{}", serde_json::json!({"operation": op, "allowed": false, "violation": violation, "message": violation.to_string()}));
            } else {
                println!("DENY {}", violation);
            }
            Err(violation.into())
        }
    }
}

fn main() {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new("info"))
        .unwrap_or_else(|_| EnvFilter::new("info"));
    fmt().with_env_filter(filter).with_writer(std::io::stderr).init();

    let mut args: Vec<String> = env::args().collect();
    let program = if args.is_empty() { "mudsec_audit".to_string() } else { args.remove(0) };
    if args.iter().any(|a| a == "--help" || a == "-h") {
        print_usage(&program);
        return;
    }

    let code = match parse_args(&args).and_then(run) {
        Ok(true) => 0,
        Ok(false) => AppError::denied("security_denied", "not allowed").exit_code(),
        Err(e) => {
            if !matches!(e, AppError::Denied { .. }) {
                eprintln!("error: {}", e);
                if matches!(e, AppError::UserInput { .. }) { print_usage(&program); }
            }
            e.exit_code()
        }
    };
    std::process::exit(code);
}
