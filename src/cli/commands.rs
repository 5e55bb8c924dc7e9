use std::path::PathBuf;

use anyhow::{anyhow, bail, Result};
use chrono::Local;
use tracing::debug;

use super::outputformatter::print_table;
use crate::api::{AssignmentDraft, Level, RecruitmentBonusForm, UploadFile};
use crate::earnings::{format_eur, recent_periods, EarningsRecord, ManagerType, Period, SortDirection, SortField, SortState};
use crate::identity::{AuthorizationGate, SessionStore};
use crate::views::{Completion, DashboardView, GenealogyView, Loadable, ReportsView, UploadHistoryView};

pub const COMMAND_HELP: &str = "  whoami                                   show the logged-in user
  login <email> <password>                 log in (REPL)
  logout                                   end the session
  periods                                  list the last twelve months
  earnings <period> [manager-id]           earnings breakdown (own, or any manager as admin)
  payout <period>                          request a payout of the period's total
  report <period> [--sort F] [--asc] [--export FILE]
                                           all managers for a period (admin)
                                           F: managerName managerType totalEarnings baseCommission creatorCount totalRevenue
  bonus <manager-id> <period> <live|team> [description]
                                           award a recruitment bonus (admin)
  upload <file.xlsx>                       import a spreadsheet (admin)
  batches | batch <id>                     upload history (admin)
  genealogy list | team <id> | delete <id> (admin)
  genealogy add <manager-id> <parent-id> <A|B|C> [rate]
  genealogy update <id> <manager-id> <parent-id> <A|B|C> [rate]
  rates                                    commission rate table (admin)
  help | quit";

#[derive(Debug, Clone, PartialEq)]
pub enum GenealogyCommand {
    List,
    Team(String),
    Add(AssignmentDraft),
    Update(String, AssignmentDraft),
    Delete(String),
}

#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    Help,
    Whoami,
    Login { email: String, password: String },
    Logout,
    Periods,
    Earnings { period: Period, manager_id: Option<String> },
    Payout { period: Period },
    Report { period: Period, sort: SortState, export: Option<PathBuf> },
    Bonus(RecruitmentBonusForm),
    Upload(PathBuf),
    Batches,
    Batch(String),
    Genealogy(GenealogyCommand),
    Rates,
}

fn arg<'a>(words: &'a [String], i: usize, what: &str) -> Result<&'a str> {
    words.get(i).map(String::as_str).ok_or_else(|| anyhow!("missing {}", what))
}

fn period_arg(words: &[String], i: usize) -> Result<Period> {
    Ok(Period::parse(arg(words, i, "period (YYYYMM)")?)?)
}

fn draft_from(words: &[String], at: usize) -> Result<AssignmentDraft> {
    let mut d = AssignmentDraft {
        manager_id: arg(words, at, "manager id")?.to_string(),
        parent_manager_id: arg(words, at + 1, "parent manager id")?.to_string(),
        ..AssignmentDraft::default()
    };
    let level = arg(words, at + 2, "level (A, B or C)")?;
    d.set_level(Level::parse(level).ok_or_else(|| anyhow!("unknown level '{}'", level))?);
    if let Some(rate) = words.get(at + 3) {
        d.commission_rate = rate.replace(',', ".").parse().map_err(|_| anyhow!("invalid rate '{}'", rate))?;
    }
    Ok(d)
}

impl Command {
    pub fn parse(words: &[String]) -> Result<Self> {
        let Some(head) = words.first() else { bail!("no command given") };
        let cmd = match head.to_ascii_lowercase().as_str() {
            "help" => Command::Help,
            "whoami" => Command::Whoami,
            "login" => Command::Login {
                email: arg(words, 1, "email")?.to_string(),
                password: arg(words, 2, "password")?.to_string(),
            },
            "logout" => Command::Logout,
            "periods" => Command::Periods,
            "earnings" => Command::Earnings { period: period_arg(words, 1)?, manager_id: words.get(2).cloned() },
            "payout" => Command::Payout { period: period_arg(words, 1)? },
            "report" => {
                let period = period_arg(words, 1)?;
                let mut field = SortField::TotalEarnings;
                let mut direction = SortDirection::Descending;
                let mut export = None;
                let mut i = 2;
                while i < words.len() {
                    match words[i].as_str() {
                        "--sort" => {
                            let f = arg(words, i + 1, "sort field")?;
                            field = SortField::parse(f).ok_or_else(|| anyhow!("unknown sort field '{}'", f))?;
                            i += 2;
                        }
                        "--asc" => { direction = SortDirection::Ascending; i += 1; }
                        "--desc" => { direction = SortDirection::Descending; i += 1; }
                        "--export" => {
                            export = Some(PathBuf::from(arg(words, i + 1, "export file")?));
                            i += 2;
                        }
                        other => bail!("unexpected report option '{}'", other),
                    }
                }
                Command::Report { period, sort: SortState::new(field, direction), export }
            }
            "bonus" => {
                let kind = arg(words, 3, "manager type (live|team)")?;
                Command::Bonus(RecruitmentBonusForm {
                    manager_id: arg(words, 1, "manager id")?.to_string(),
                    period: arg(words, 2, "period")?.to_string(),
                    manager_type: Some(ManagerType::parse(kind).ok_or_else(|| anyhow!("manager type must be live or team"))?),
                    description: words.get(4..).map(|w| w.join(" ")).unwrap_or_default(),
                })
            }
            "upload" => Command::Upload(PathBuf::from(arg(words, 1, "file")?)),
            "batches" => Command::Batches,
            "batch" => Command::Batch(arg(words, 1, "batch id")?.to_string()),
            "rates" => Command::Rates,
            "genealogy" => {
                let sub = words.get(1).map(|s| s.to_ascii_lowercase()).unwrap_or_else(|| "list".to_string());
                Command::Genealogy(match sub.as_str() {
                    "list" => GenealogyCommand::List,
                    "team" => GenealogyCommand::Team(arg(words, 2, "team manager id")?.to_string()),
                    "add" => GenealogyCommand::Add(draft_from(words, 2)?),
                    "update" => GenealogyCommand::Update(arg(words, 2, "assignment id")?.to_string(), draft_from(words, 3)?),
                    "delete" => GenealogyCommand::Delete(arg(words, 2, "assignment id")?.to_string()),
                    other => bail!("unknown genealogy command '{}'", other),
                })
            }
            other => bail!("unknown command '{}'; type 'help'", other),
        };
        Ok(cmd)
    }

    pub fn name(&self) -> &'static str {
        match self {
            Command::Help => "help",
            Command::Whoami => "whoami",
            Command::Login { .. } => "login",
            Command::Logout => "logout",
            Command::Periods => "periods",
            Command::Earnings { .. } => "earnings",
            Command::Payout { .. } => "payout",
            Command::Report { .. } => "report",
            Command::Bonus(_) => "bonus",
            Command::Upload(_) => "upload",
            Command::Batches => "batches",
            Command::Batch(_) => "batch",
            Command::Genealogy(_) => "genealogy",
            Command::Rates => "rates",
        }
    }

    /// Gate the command runs behind; None for commands that need no session.
    pub fn gate(&self) -> Option<AuthorizationGate> {
        match self {
            Command::Help | Command::Login { .. } | Command::Logout | Command::Periods => None,
            Command::Whoami | Command::Payout { .. } | Command::Earnings { manager_id: None, .. } => Some(AuthorizationGate::any_user()),
            _ => Some(AuthorizationGate::admin_only()),
        }
    }
}

fn check_gate(cmd: &Command, store: &SessionStore) -> Result<()> {
    let Some(gate) = cmd.gate() else { return Ok(()) };
    if let Err(f) = gate.check(&store.snapshot()) {
        let action = f.action.map(|r| format!(" [{} -> {}]", f.action_label, r.path())).unwrap_or_default();
        bail!("{}: {}{}", f.title, f.message, action);
    }
    Ok(())
}

fn outcome<T>(done: Completion, state: &Loadable<T>) -> Result<()> {
    match (done, state.error()) {
        (Completion::Failed, Some(e)) => Err(anyhow!(e.user_message())),
        _ => Ok(()),
    }
}

fn print_breakdown(r: &EarningsRecord) {
    println!("{} ({}) {}", r.manager_name, r.manager_type.as_str(), r.period.label());
    let mut rows: Vec<Vec<String>> = r.breakdown().into_iter().map(|(name, v)| vec![name.to_string(), format_eur(v)]).collect();
    rows.push(vec!["Total".to_string(), format_eur(r.total_earnings)]);
    print_table(&["Component", "Amount"], &rows);
    println!("creators: {}, revenue: {}", r.creator_count, format_eur(r.total_revenue));
}

pub async fn execute(cmd: &Command, store: &SessionStore) -> Result<()> {
    check_gate(cmd, store)?;
    let api = store.api();
    debug!(target: "commission_desk::cli", "execute {}", cmd.name());
    match cmd {
        Command::Help => println!("{}", COMMAND_HELP),
        Command::Whoami => {
            if let Some(id) = store.identity() {
                let manager = id.manager.as_ref().map(|m| format!(", manager {}", m.id)).unwrap_or_default();
                println!("{} <{}> role={}{}", id.display_name(), id.email, id.role.as_str(), manager);
            }
        }
        Command::Login { email, password } => {
            let id = store.login(email, password).await?;
            println!("logged in as {} ({})", id.display_name(), id.role.as_str());
        }
        Command::Logout => {
            store.logout();
            println!("logged out");
        }
        Command::Periods => {
            let rows: Vec<Vec<String>> = recent_periods(Local::now().date_naive(), 12)
                .into_iter()
                .map(|p| vec![p.to_string(), p.label()])
                .collect();
            print_table(&["Period", "Month"], &rows);
        }
        Command::Earnings { period, manager_id: Some(id) } => {
            let record = api.managers().earnings(id, period).await?;
            print_breakdown(&record);
        }
        Command::Earnings { period, manager_id: None } => {
            let identity = store.identity().ok_or_else(|| anyhow!("not logged in"))?;
            let mut view = DashboardView::new(&identity, period.clone());
            let done = view.refresh(api).await;
            outcome(done, view.earnings())?;
            if let Some(r) = view.earnings().data() {
                print_breakdown(r);
            }
        }
        Command::Payout { period } => {
            let identity = store.identity().ok_or_else(|| anyhow!("not logged in"))?;
            let mut view = DashboardView::new(&identity, period.clone());
            outcome(view.refresh(api).await, view.earnings())?;
            if !view.can_request_payout() {
                bail!("No earnings available for payout in {}", period.label());
            }
            outcome(view.request_payout(api).await, view.payout())?;
            if let Some(p) = view.payout().data() {
                println!("payout requested: {} for {} (status {:?})", format_eur(p.amount), p.period.label(), p.status);
            }
        }
        Command::Report { period, sort, export } => {
            let mut view = ReportsView::new(period.clone());
            view.set_sort(*sort);
            outcome(view.refresh(api).await, view.earnings())?;
            let rows: Vec<Vec<String>> = view
                .rows()
                .into_iter()
                .map(|r| {
                    vec![
                        r.manager_name.clone(),
                        r.manager_type.as_str().to_string(),
                        format_eur(r.total_earnings),
                        format_eur(r.base_commission),
                        format_eur(r.milestones.total),
                        format_eur(r.other_bonus_total()),
                        r.creator_count.to_string(),
                        format_eur(r.total_revenue),
                    ]
                })
                .collect();
            print_table(&["Manager", "Type", "Total", "Base", "Milestones", "Other bonuses", "Creators", "Revenue"], &rows);
            let s = view.summary();
            println!(
                "{}: {} managers, earnings {}, revenue {}, creators {}",
                period.label(), s.manager_count, format_eur(s.total_earnings), format_eur(s.total_revenue), s.total_creators
            );
            if let (Some(target), Some(file)) = (export, view.export()) {
                let path = if target.is_dir() { file.write_to(target)? } else {
                    crate::earnings::write_export(target, &file.contents)?;
                    target.clone()
                };
                println!("exported {}", path.display());
            }
        }
        Command::Bonus(form) => {
            api.managers().award_recruitment_bonus(form).await?;
            println!(
                "recruitment bonus of {} awarded to {} for {}",
                format_eur(form.bonus_amount().unwrap_or_default()), form.manager_id, form.period
            );
        }
        Command::Upload(path) => {
            let file = UploadFile::open(path).await?;
            let mut view = UploadHistoryView::new();
            outcome(view.upload(api, file).await, view.last_upload())?;
            if let Some(r) = view.last_upload().data() {
                println!(
                    "{} processed={} new creators={} new managers={} transactions={}",
                    if r.message.is_empty() { "upload complete" } else { r.message.as_str() },
                    r.processed_rows, r.new_creators_count, r.new_managers_count, r.transactions_created
                );
                for w in &r.warnings {
                    println!("warning: {}", w);
                }
            }
        }
        Command::Batches => {
            let mut view = UploadHistoryView::new();
            outcome(view.refresh(api).await, view.batches())?;
            let rows: Vec<Vec<String>> = view
                .batches()
                .data()
                .map(Vec::as_slice)
                .unwrap_or(&[])
                .iter()
                .map(|b| {
                    vec![
                        b.id.clone(),
                        b.data_month.clone(),
                        b.original_file_name.clone(),
                        b.processed_rows.to_string(),
                        b.skipped_rows.to_string(),
                        b.warnings.len().to_string(),
                        b.created_at.clone(),
                    ]
                })
                .collect();
            print_table(&["Id", "Month", "File", "Processed", "Skipped", "Warnings", "Created"], &rows);
        }
        Command::Batch(id) => {
            let b = api.uploads().batch(id).await?;
            println!("{}", serde_json::to_string_pretty(&b)?);
        }
        Command::Rates => {
            let v = api.managers().commission_rates().await?;
            println!("{}", serde_json::to_string_pretty(&v)?);
        }
        Command::Genealogy(sub) => genealogy(sub, store).await?,
    }
    Ok(())
}

async fn genealogy(sub: &GenealogyCommand, store: &SessionStore) -> Result<()> {
    let api = store.api();
    let mut view = GenealogyView::new();
    match sub {
        GenealogyCommand::Team(id) => {
            let v = api.genealogy().team_downline(id).await?;
            println!("{}", serde_json::to_string_pretty(&v)?);
            return Ok(());
        }
        GenealogyCommand::List => {
            outcome(view.refresh(api).await, view.assignments())?;
        }
        GenealogyCommand::Add(draft) => {
            *view.draft_mut() = draft.clone();
            view.submit(api).await?;
        }
        GenealogyCommand::Update(id, draft) => {
            view.refresh(api).await;
            let existing = view
                .assignments()
                .data()
                .and_then(|all| all.iter().find(|a| &a.id == id).cloned())
                .ok_or_else(|| anyhow!("no genealogy assignment with id {}", id))?;
            view.edit(&existing);
            *view.draft_mut() = draft.clone();
            view.submit(api).await?;
        }
        GenealogyCommand::Delete(id) => view.delete(api, id).await?,
    }
    if let Some(n) = view.notice() {
        println!("{}", n);
    }
    let rows: Vec<Vec<String>> = view
        .assignments()
        .data()
        .map(Vec::as_slice)
        .unwrap_or(&[])
        .iter()
        .map(|a| {
            vec![
                a.id.clone(),
                a.manager.name.clone(),
                a.parent_manager.name.clone(),
                a.level.as_str().to_string(),
                format!("{}%", a.commission_rate),
            ]
        })
        .collect();
    print_table(&["Id", "Manager", "Parent", "Level", "Rate"], &rows);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn words(s: &str) -> Vec<String> { s.split_whitespace().map(str::to_string).collect() }

    #[test]
    fn parses_report_options() {
        let c = Command::parse(&words("report 202609 --sort managerName --asc --export out.csv")).unwrap();
        assert_eq!(
            c,
            Command::Report {
                period: Period::parse("202609").unwrap(),
                sort: SortState::new(SortField::ManagerName, SortDirection::Ascending),
                export: Some(PathBuf::from("out.csv")),
            }
        );
        assert!(Command::parse(&words("report 2026-09")).is_err());
        assert!(Command::parse(&words("report 202609 --sort nope")).is_err());
    }

    #[test]
    fn bonus_description_takes_rest_of_line() {
        let Command::Bonus(f) = Command::parse(&words("bonus m7 202609 team signed in September")).unwrap() else {
            panic!("expected bonus");
        };
        assert_eq!(f.description, "signed in September");
        assert_eq!(f.manager_type, Some(ManagerType::Team));
    }

    #[test]
    fn genealogy_add_uses_level_default_unless_rate_given() {
        let Command::Genealogy(GenealogyCommand::Add(d)) = Command::parse(&words("genealogy add m2 t1 B")).unwrap() else {
            panic!("expected add");
        };
        assert_eq!(d.commission_rate, 7.5);
        let Command::Genealogy(GenealogyCommand::Update(id, d)) =
            Command::parse(&words("genealogy update g1 m2 t1 C 4,5")).unwrap()
        else {
            panic!("expected update");
        };
        assert_eq!(id, "g1");
        assert_eq!(d.commission_rate, 4.5);
    }

    #[test]
    fn gates_by_command() {
        let admin = Some(AuthorizationGate::admin_only());
        assert_eq!(Command::parse(&words("report 202609")).unwrap().gate(), admin);
        assert_eq!(Command::parse(&words("earnings 202609 m2")).unwrap().gate(), admin);
        assert_eq!(Command::parse(&words("earnings 202609")).unwrap().gate(), Some(AuthorizationGate::any_user()));
        assert_eq!(Command::parse(&words("periods")).unwrap().gate(), None);
    }
}
