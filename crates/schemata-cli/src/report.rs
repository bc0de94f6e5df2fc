//! Plain-text report of a workspace after a scenario run.

use std::fmt::Write;

use schemata::{Workspace, catalog::ObjectBody, identifier::ObjectId, store::Store};

/// Renders the catalog of every model, the layer tree of every diagram,
/// the status log and the undo stack.
pub fn render(workspace: &Workspace, status: &[String]) -> String {
    let store = workspace.store();
    let mut out = String::new();

    for model in store.models() {
        let _ = writeln!(out, "model {}", model.name);
        for schema in &model.schemas {
            render_object(store, *schema, 1, &mut out);
        }
        for diagram in model.diagrams.iter().filter_map(|d| store.diagram(*d)) {
            let _ = writeln!(out, "  diagram {}", diagram.name);
            if let Some(tree) = workspace.tree(diagram.id) {
                for line in tree.render().lines() {
                    let _ = writeln!(out, "    {line}");
                }
            }
        }
    }

    out.push_str("status\n");
    for line in status {
        let _ = writeln!(out, "  {line}");
    }
    out.push_str("undo\n");
    for label in workspace.undo_labels() {
        let _ = writeln!(out, "  {label}");
    }
    out
}

fn render_object(store: &Store, id: ObjectId, depth: usize, out: &mut String) {
    let Some(object) = store.object(id) else {
        return;
    };
    let indent = depth * 2;
    let _ = write!(out, "{:indent$}{} {}", "", object.kind(), object.name);
    match &object.body {
        ObjectBody::Table(table) => {
            let columns: Vec<String> = table
                .columns
                .iter()
                .map(|c| format!("{} {}", c.name, c.data_type))
                .collect();
            let _ = writeln!(out, " ({})", columns.join(", "));
            for fk in &table.foreign_keys {
                render_object(store, *fk, depth + 1, out);
            }
        }
        ObjectBody::ForeignKey(fk) => {
            let target = fk
                .target
                .and_then(|t| store.object(t))
                .map_or("?", |t| t.name.as_str());
            let _ = writeln!(out, " -> {target}");
        }
        ObjectBody::RoutineGroup(group) => {
            let routines: Vec<&str> = group
                .routines
                .iter()
                .filter_map(|r| store.object(*r))
                .map(|r| r.name.as_str())
                .collect();
            let _ = writeln!(out, " [{}]", routines.join(", "));
        }
        ObjectBody::Schema(schema) => {
            out.push('\n');
            for child in &schema.children {
                render_object(store, *child, depth + 1, out);
            }
        }
        ObjectBody::View(_) | ObjectBody::Routine(_) => out.push('\n'),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use schemata::catalog::{Column, ColumnPair};

    #[test]
    fn test_render_catalog() {
        let mut ws = Workspace::default();
        let model = ws.create_model("shop").unwrap();
        let schema = ws.create_schema(model, "public").unwrap();
        let customers = ws
            .create_table(schema, "customers", vec![Column::new("id", "int")])
            .unwrap();
        let orders = ws
            .create_table(schema, "orders", vec![Column::new("customer_id", "int")])
            .unwrap();
        ws.create_foreign_key(
            orders,
            "orders_customer_fk",
            Some(customers),
            vec![ColumnPair::new("customer_id", "id")],
        )
        .unwrap();

        let status = ws.take_status();
        let report = render(&ws, &status);
        assert!(report.starts_with("model shop\n  schema public\n"));
        assert!(report.contains("    table orders (customer_id int)\n"));
        assert!(report.contains("      foreign key orders_customer_fk -> customers\n"));
        assert!(report.contains("  Create foreign key\n"));
    }
}
