use comfy_table::{Attribute, Cell, CellAlignment, Color, Table, modifiers, presets};

use crate::sensor::{SensorOutput, SensorState};

pub fn build_outputs_table(outputs: &[SensorOutput]) -> Table {
    let mut table = Table::new();
    table
        .load_preset(presets::UTF8_FULL_CONDENSED)
        .apply_modifier(modifiers::UTF8_ROUND_CORNERS)
        .enforce_styling();
    table.set_header(vec!["Entity", "Name", "State", "Unit"]);
    for output in outputs {
        table.add_row(vec![
            Cell::new(&output.entity_id).add_attribute(Attribute::Dim),
            Cell::new(&output.name),
            Cell::new(&output.state).set_alignment(CellAlignment::Right).fg(match output.state {
                SensorState::Available(_) => Color::Green,
                SensorState::Unavailable => Color::Red,
            }),
            Cell::new(output.unit.symbol()).add_attribute(Attribute::Dim),
        ]);
    }
    table
}
