//! Property-based tests for chain rebuilds.
//!
//! Random sequences of structural commands must keep the cabinet last, keep
//! the graph matching the list, and an add followed by its remove must leave
//! the chain exactly as it was.

use proptest::prelude::*;
use stomp_core::{AudioContext, Effect, EffectId};
use stomp_effects::{Cabinet, Chorus, Compressor, Pedal, Phaser, Tremolo};
use stomp_rig::ChainManager;

const SAMPLE_RATE: f32 = 48000.0;

fn make_pedal(ctx: &AudioContext, kind: u8) -> Pedal {
    match kind % 5 {
        0 => Cabinet::new(ctx).into(),
        1 => Chorus::new(ctx).into(),
        2 => Compressor::new(ctx).into(),
        3 => Phaser::new(ctx).into(),
        _ => Tremolo::new(ctx).into(),
    }
}

#[derive(Debug, Clone)]
enum Command {
    Add { kind: u8, post: bool },
    Remove(usize),
    Move(usize, usize),
    Toggle(usize),
}

fn command() -> impl Strategy<Value = Command> {
    prop_oneof![
        3 => (any::<u8>(), any::<bool>()).prop_map(|(kind, post)| Command::Add { kind, post }),
        1 => (0usize..8).prop_map(Command::Remove),
        1 => (0usize..8, 0usize..8).prop_map(|(a, b)| Command::Move(a, b)),
        1 => (0usize..8).prop_map(Command::Toggle),
    ]
}

fn ids(chain: &ChainManager) -> Vec<EffectId> {
    chain.effects().iter().map(|e| e.id()).collect()
}

fn assert_wired(ctx: &AudioContext, chain: &ChainManager) {
    let effects = chain.effects();
    match effects.first() {
        None => assert_eq!(ctx.outputs(ctx.line_in()), vec![chain.sink()]),
        Some(first) => assert_eq!(ctx.outputs(ctx.line_in()), vec![first.input()]),
    }
    for pair in effects.windows(2) {
        assert_eq!(ctx.outputs(pair[0].output()), vec![pair[1].input()]);
    }
    if let Some(last) = effects.last() {
        assert_eq!(ctx.outputs(last.output()), vec![chain.sink()]);
    }
}

fn apply(ctx: &AudioContext, chain: &mut ChainManager, command: &Command) {
    match *command {
        Command::Add { kind, post } => {
            chain.add_effect(make_pedal(ctx, kind), post);
        }
        Command::Remove(idx) => {
            if let Some(id) = chain.effects().get(idx).map(|e| e.id())
                && let Some(mut pedal) = chain.remove_effect(id)
            {
                pedal.dispose();
            }
        }
        Command::Move(from, to) => {
            chain.move_effect(from, to);
        }
        Command::Toggle(idx) => {
            if let Some(id) = chain.effects().get(idx).map(|e| e.id()) {
                chain.toggle_effect(id);
            }
        }
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(32))]

    #[test]
    fn cabinet_is_always_last(commands in prop::collection::vec(command(), 1..24)) {
        let ctx = AudioContext::new(SAMPLE_RATE);
        let mut chain = ChainManager::new(&ctx);

        for command in &commands {
            apply(&ctx, &mut chain, command);

            let terminals: Vec<usize> = chain
                .effects()
                .iter()
                .enumerate()
                .filter(|(_, e)| e.is_terminal())
                .map(|(i, _)| i)
                .collect();
            prop_assert!(terminals.len() <= 1);
            if let Some(&i) = terminals.first() {
                prop_assert_eq!(i, chain.len() - 1);
            }
            assert_wired(&ctx, &chain);
        }
    }

    #[test]
    fn add_then_remove_round_trips(
        setup in prop::collection::vec((any::<u8>(), any::<bool>()), 0..6),
        kind in 1u8..5,
        post in any::<bool>(),
    ) {
        let ctx = AudioContext::new(SAMPLE_RATE);
        let mut chain = ChainManager::new(&ctx);
        for &(kind, post) in &setup {
            chain.add_effect(make_pedal(&ctx, kind), post);
        }
        let before = ids(&chain);
        let edges = ctx.edge_count();

        let id = chain.add_effect(make_pedal(&ctx, kind), post);
        let mut removed = chain.remove_effect(id).unwrap();
        removed.dispose();

        prop_assert_eq!(ids(&chain), before);
        prop_assert_eq!(ctx.edge_count(), edges);
        assert_wired(&ctx, &chain);
    }
}
