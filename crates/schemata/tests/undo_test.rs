//! Property tests for undo and redo over random edit sequences.

use proptest::prelude::*;

use schemata::{
    Workspace, WorkspaceBuilder,
    catalog::{Column, ColumnPair},
    config::AppConfig,
    deletion::Target,
    diagram::Element,
    geometry::{Bounds, Point},
    identifier::{DiagramId, ModelId},
    kind::FigureKind,
    placement::{PlaceOptions, Subject},
    prompt::{Answer, FixedPrompt},
};

#[derive(Debug, Clone)]
enum Op {
    PlaceTable(f32, f32),
    PlaceNote(f32, f32),
    AddLayer(f32, f32),
    MoveFigure(usize, f32, f32),
    DeleteFigure(usize, bool),
    LinkTables(usize, usize),
    PasteFigure(usize),
    Rename(usize),
}

fn coordinate() -> impl Strategy<Value = f32> {
    (0u16..80).prop_map(|n| f32::from(n) * 10.0)
}

fn op() -> impl Strategy<Value = Op> {
    prop_oneof![
        (coordinate(), coordinate()).prop_map(|(x, y)| Op::PlaceTable(x, y)),
        (coordinate(), coordinate()).prop_map(|(x, y)| Op::PlaceNote(x, y)),
        (coordinate(), coordinate()).prop_map(|(x, y)| Op::AddLayer(x, y)),
        (0usize..8, coordinate(), coordinate()).prop_map(|(i, x, y)| Op::MoveFigure(i, x, y)),
        (0usize..8, any::<bool>()).prop_map(|(i, only)| Op::DeleteFigure(i, only)),
        (0usize..8, 0usize..8).prop_map(|(a, b)| Op::LinkTables(a, b)),
        (0usize..8).prop_map(Op::PasteFigure),
        (0usize..8).prop_map(Op::Rename),
    ]
}

fn setup() -> (Workspace, ModelId, DiagramId) {
    let mut ws = WorkspaceBuilder::new(AppConfig::default())
        .with_prompt(FixedPrompt::new(Answer::Yes))
        .build();
    let model = ws.create_model("shop").unwrap();
    let diagram = ws.create_diagram(model, "main").unwrap();
    (ws, model, diagram)
}

fn pick<T: Copy>(items: &[T], i: usize) -> Option<T> {
    items.get(i % items.len().max(1)).copied()
}

/// Applies `op`; failures are allowed and must leave no trace.
fn apply(ws: &mut Workspace, model: ModelId, diagram: DiagramId, op: &Op) {
    let figures = ws.store().diagram(diagram).unwrap().figures.clone();
    let tables: Vec<_> = ws
        .store()
        .objects()
        .filter(|o| o.model == model && o.as_table().is_some())
        .map(|o| o.id)
        .collect();
    let _ = match *op {
        Op::PlaceTable(x, y) => ws
            .place(
                diagram,
                Point::new(x, y),
                Subject::Kind(FigureKind::Table),
                PlaceOptions::default().with_columns(vec![
                    Column::new("id", "int"),
                    Column::new("ref_id", "int"),
                ]),
            )
            .map(drop),
        Op::PlaceNote(x, y) => ws
            .place(
                diagram,
                Point::new(x, y),
                Subject::Kind(FigureKind::Note),
                PlaceOptions::default().with_text("todo"),
            )
            .map(drop),
        Op::AddLayer(x, y) => ws
            .add_layer(diagram, Bounds::from_rect(x, y, 200.0, 150.0), "area")
            .map(drop),
        Op::MoveFigure(i, x, y) => match pick(&figures, i) {
            Some(figure) => ws.move_figure(figure, Point::new(x, y)),
            None => Ok(()),
        },
        Op::DeleteFigure(i, only) => match pick(&figures, i) {
            Some(figure) => ws.delete(Target::Figure(figure), only).map(drop),
            None => Ok(()),
        },
        Op::LinkTables(a, b) => match (pick(&tables, a), pick(&tables, b)) {
            (Some(from), Some(to)) => ws
                .create_foreign_key(from, "fk", Some(to), vec![ColumnPair::new("ref_id", "id")])
                .map(drop),
            _ => Ok(()),
        },
        Op::PasteFigure(i) => match pick(&figures, i) {
            Some(figure) => ws
                .copy_elements(diagram, &[Element::Figure(figure)])
                .and_then(|clipboard| ws.paste(diagram, &clipboard))
                .map(drop),
            None => Ok(()),
        },
        Op::Rename(i) => match pick(&tables, i) {
            Some(table) => ws.rename(table, "renamed").map(drop),
            None => Ok(()),
        },
    };
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn prop_undo_all_restores_initial_state(ops in proptest::collection::vec(op(), 1..12)) {
        let (mut ws, model, diagram) = setup();
        let initial = ws.store().arena().clone();
        let base = ws.undo_labels().len();

        for op in &ops {
            apply(&mut ws, model, diagram, op);
        }
        let edited = ws.store().arena().clone();
        let entries = ws.undo_labels().len() - base;

        for _ in 0..entries {
            prop_assert!(ws.undo().unwrap());
        }
        prop_assert_eq!(ws.store().arena(), &initial);

        for _ in 0..entries {
            prop_assert!(ws.redo().unwrap());
        }
        prop_assert_eq!(ws.store().arena(), &edited);
    }

    #[test]
    fn prop_connections_match_resolved_keys(ops in proptest::collection::vec(op(), 1..12)) {
        let (mut ws, model, diagram) = setup();
        for op in &ops {
            apply(&mut ws, model, diagram, op);
        }
        let store = ws.store();
        for fk in store.foreign_keys_of(model) {
            let object = store.object(fk).unwrap();
            let target = object.as_foreign_key().and_then(|k| k.target);
            let both_shown = object.parent.is_some_and(|t| store.figure_for(diagram, t).is_some())
                && target.is_some_and(|t| store.figure_for(diagram, t).is_some());
            let expected = usize::from(both_shown && schemata::sync::is_resolved(store, fk));
            let shown = store.connections_for(diagram, fk).len();
            prop_assert!(shown <= 1);
            prop_assert_eq!(shown, expected);
        }
    }
}
