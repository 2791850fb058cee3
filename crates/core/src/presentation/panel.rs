//! Platform-neutral panel content and the renderers that build it.

use serde::Serialize;
use serde_json::{json, Value};

use crate::session::{ControlId, ControlSet, HuntStatus, PanelKind, SessionState, WorkStatus};

/// One titled block of a panel. Inline fields sit side by side.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PanelField {
    /// Heading of the block.
    pub name: String,
    /// Body text, possibly several lines.
    pub value: String,
    /// Whether the block may share a row with its neighbours.
    pub inline: bool,
}

impl PanelField {
    fn inline(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
            inline: true,
        }
    }
}

/// Rendered panel, independent of the chat platform.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PanelContent {
    /// Heading, carrying the work status in parentheses.
    pub title: String,
    /// Fixed explanation under the title.
    pub description: String,
    /// Blocks in display order.
    pub fields: Vec<PanelField>,
    /// Last reported notice, e.g. a refused mode switch.
    pub footer: Option<String>,
}

impl PanelContent {
    /// The panel as a chat embed payload.
    pub fn to_embed(&self) -> Value {
        let mut embed = json!({
            "title": self.title,
            "description": self.description,
            "fields": self.fields,
        });
        if let Some(footer) = &self.footer {
            embed["footer"] = json!({ "text": footer });
        }
        embed
    }
}

/// The button row as a chat component payload.
pub fn components(controls: &ControlSet) -> Value {
    let buttons: Vec<Value> = controls
        .iter()
        .map(|(id, control)| {
            json!({
                "type": 2,
                "custom_id": id.as_str(),
                "label": control.label,
                "style": button_style(id),
                "disabled": !control.enabled,
            })
        })
        .collect();
    json!([{ "type": 1, "components": buttons }])
}

fn button_style(id: ControlId) -> u8 {
    match id {
        ControlId::Work => 2,
        ControlId::Hunt => 1,
        ControlId::Cancel => 4,
    }
}

/// Render whichever panel the session currently displays.
pub fn render(state: &SessionState) -> PanelContent {
    match state.displayed() {
        PanelKind::Work => render_work_panel(state),
        PanelKind::Hunt => render_hunt_panel(state),
    }
}

/// The workstation: price list, bought counter, silver and health with bout deltas.
pub fn render_work_panel(state: &SessionState) -> PanelContent {
    let tuning = state.tuning();
    let player = state.player();
    let bout = state.bout();
    let unit = tuning.work_unit_counter();
    let price = tuning.work_unit_price();

    let title = match work_status_text(state.work_status()) {
        Some(status) => format!("Workstation ({status})"),
        None => "Workstation".to_string(),
    };
    let description = format!(
        "--- Work to buy Counter and recover your Health ---\n\
         -> {unit} Counter costs {price} silvers\n\
         -> {unit} Counter recover {price} health"
    );

    let (silver_delta, health_delta) = if bout.units > 0 {
        (
            format!("(-{})", bout.silver_spent),
            format!("(+{})", bout.health_gained),
        )
    } else {
        (String::new(), String::new())
    };

    PanelContent {
        title,
        description,
        fields: vec![
            PanelField::inline("Counter", bout.counter.to_string()),
            PanelField::inline("Your Silver", format!("{}{silver_delta}", player.silver)),
            PanelField::inline(
                "Your Health",
                format!("{}/{}{health_delta}", player.health, player.max_health),
            ),
        ],
        footer: state.notice().map(str::to_owned),
    }
}

fn work_status_text(status: WorkStatus) -> Option<String> {
    let text = match status {
        WorkStatus::Ready => return None,
        WorkStatus::Working(step) => format!("Working{}", dots(step)),
        WorkStatus::NotEnoughSilverToStart => "Not enough silver to do it".into(),
        WorkStatus::AlreadyAtMaxHealth => "You are already at maximum health".into(),
        WorkStatus::ReachedMaxHealth => "You have reached maximum health".into(),
        WorkStatus::NotEnoughSilverToContinue => "Not enough silver to continue".into(),
    };
    Some(text)
}

/// Game information: player summary and the monster field.
pub fn render_hunt_panel(state: &SessionState) -> PanelContent {
    let player = state.player();
    let summary = format!(
        "Name: {}\nLevel: {}\nExperience: {}\nSilver: {}\nHealth: {}/{}\nMonsters Defeated: {}",
        player.name,
        player.level,
        player.experience,
        player.silver,
        player.health,
        player.max_health,
        state.monsters_defeated(),
    );

    let monster = match (state.hunt_status(), state.encounter()) {
        (HuntStatus::Engaged, Some(monster)) => PanelField::inline(
            "Monster found",
            format!(
                "Name: {}\nLevel: {}\nHealth: {}/{}",
                monster.name, monster.level, monster.health, monster.max_health
            ),
        ),
        (HuntStatus::Searching(step), _) => {
            PanelField::inline(format!("Hunting{}", dots(step)), "No monsters currently")
        }
        _ => PanelField::inline("", ""),
    };

    PanelContent {
        title: "Game Information".to_string(),
        description: "Kill monsters to farm silver and experience".to_string(),
        fields: vec![PanelField::inline("Player", summary), monster],
        footer: state.notice().map(str::to_owned),
    }
}

fn dots(step: u8) -> String {
    ".".repeat(usize::from(step) + 1)
}
