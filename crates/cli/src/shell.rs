use crate::commands::Command;
use anyhow::Context;
use convodeck_core::{
    build_shareable_message, build_summary, order_message_link, validation_messages, Category,
    DeckConfig, DeckPatch, DeckStore, IdRng, KeyValueStorage, Mutation, StoreConfig,
    REQUIRED_TOTAL,
};
use std::io::Write;
use time::OffsetDateTime;
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Quit,
}

/// Terminal front end over one deck session.
pub struct Shell<S> {
    deck: DeckStore<S>,
    store: StoreConfig,
    rng: IdRng,
    clock: fn() -> OffsetDateTime,
}

impl<S: KeyValueStorage> Shell<S> {
    pub fn new(storage: S, store: StoreConfig) -> Self {
        Self {
            deck: DeckStore::new(storage),
            store,
            rng: IdRng::from_entropy(),
            clock: OffsetDateTime::now_utc,
        }
    }

    #[cfg(test)]
    fn with_fixed_time(mut self, clock: fn() -> OffsetDateTime, seed: u64) -> Self {
        self.clock = clock;
        self.rng = IdRng::from_seed(seed);
        self
    }

    pub fn execute(&mut self, command: Command, out: &mut impl Write) -> anyhow::Result<Flow> {
        debug!(?command, "execute");
        match command {
            Command::Show => self.show(out)?,
            Command::Add(category, n) => {
                let mutation = self.deck.adjust_category(category, n)?;
                self.report(mutation, out)?;
            }
            Command::Sub(category, n) => {
                let mutation = self.deck.adjust_category(category, n.saturating_neg())?;
                self.report(mutation, out)?;
            }
            Command::Set(category, n) => {
                let mutation = self.deck.set_category(category, n)?;
                self.report(mutation, out)?;
            }
            Command::Back { design, hue } => self.back(&design, hue, out)?,
            Command::Colors(colors) => {
                self.deck
                    .write(DeckPatch::default().with_colors(Some(colors)))?;
                writeln!(out, "colors saved")?;
            }
            Command::Check => {
                let config = self.deck.read()?;
                let issues = validation_messages(&config);
                if issues.is_empty() {
                    writeln!(out, "ready to order")?;
                }
                for issue in issues {
                    writeln!(out, "- {issue}")?;
                }
            }
            Command::Summary(quantity) => self.summary(quantity, false, out)?,
            Command::Share(quantity) => self.summary(quantity, true, out)?,
            Command::Designs => {
                for (index, design) in self.store.card_backs.iter().enumerate() {
                    let hue = if design.supports_hue { " [hue]" } else { "" };
                    let colors = if design.supports_colors { " [colors]" } else { "" };
                    writeln!(
                        out,
                        "{index}. {:<16} {}{hue}{colors}",
                        design.id, design.description
                    )?;
                }
            }
            Command::Reset => {
                self.deck.reset()?;
                writeln!(out, "deck cleared")?;
            }
            Command::Help => print_help(out)?,
            Command::Quit => return Ok(Flow::Quit),
        }
        Ok(Flow::Continue)
    }

    fn show(&self, out: &mut impl Write) -> anyhow::Result<()> {
        let config = self.deck.read()?;
        print_deck(&config, &self.store, out)
    }

    fn report(&self, mutation: Mutation, out: &mut impl Write) -> anyhow::Result<()> {
        match mutation {
            Mutation::Applied(config) => print_deck(&config, &self.store, out),
            Mutation::Rejected(rejection) => {
                writeln!(out, "not applied: {rejection}")?;
                Ok(())
            }
        }
    }

    fn back(&mut self, design: &str, hue: i64, out: &mut impl Write) -> anyhow::Result<()> {
        let Some(index) = self.store.card_back_index(design) else {
            writeln!(out, "unknown design '{design}' (see 'designs')")?;
            return Ok(());
        };
        let colors = self.deck.read()?.card_back_colors;
        let config = self.deck.set_card_back(design, index, hue, colors)?;
        if config.card_back.is_none() {
            writeln!(
                out,
                "finish the deck first: {} of {REQUIRED_TOTAL} cards chosen",
                config.total()
            )?;
            return Ok(());
        }
        print_deck(&config, &self.store, out)
    }

    fn summary(&mut self, quantity: u32, share: bool, out: &mut impl Write) -> anyhow::Result<()> {
        let config = self.deck.read()?;
        let now = (self.clock)();
        let summary = match build_summary(&config, &self.store, quantity, now, &mut self.rng) {
            Ok(summary) => summary,
            Err(incomplete) => {
                for message in incomplete.messages() {
                    writeln!(out, "- {message}")?;
                }
                return Ok(());
            }
        };
        writeln!(out, "{}", build_shareable_message(&summary))?;
        if share {
            writeln!(out)?;
            writeln!(
                out,
                "{}",
                order_message_link(&self.store.messaging, &summary)
            )?;
        }
        Ok(())
    }
}

fn print_deck(config: &DeckConfig, store: &StoreConfig, out: &mut impl Write) -> anyhow::Result<()> {
    writeln!(
        out,
        "deck: {}/{REQUIRED_TOTAL} cards ({} remaining)",
        config.total(),
        config.remaining()
    )?;
    for category in Category::ALL {
        writeln!(
            out,
            "  {:<11} {:>2}  {}",
            category.label(),
            config.count(category),
            category.description()
        )?;
    }
    match config.card_back_design() {
        Some(design) => {
            let name = store.card_back_name(design);
            if store.supports_hue(design) {
                writeln!(out, "card back: {name} (hue {})", config.card_back_hue)?;
            } else {
                writeln!(out, "card back: {name}")?;
            }
        }
        None => writeln!(out, "card back: not chosen")?,
    }
    Ok(())
}

pub fn print_help(out: &mut impl Write) -> anyhow::Result<()> {
    let lines = [
        ("show|s", "show the deck"),
        ("add <category> <n>", "add cards to a category"),
        ("sub <category> <n>", "remove cards from a category"),
        ("set <category> <n>", "set a category's count"),
        ("back <design> [hue]", "choose a card back (deck must be full)"),
        ("colors <up> <down> <bg>", "set custom card-back colors (#RRGGBB)"),
        ("check", "list what is missing before ordering"),
        ("summary [qty]", "show the order summary"),
        ("share [qty]", "summary plus a messaging link"),
        ("designs", "list card-back designs"),
        ("reset", "clear the deck"),
        ("help|h|?", "show help"),
        ("quit|exit", "exit"),
    ];
    writeln!(out, "Commands:").context("write help")?;
    for (usage, text) in lines {
        writeln!(out, "  {usage:<26}{text}")?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::parse_line;
    use convodeck_core::MemoryStorage;
    use time::macros::datetime;

    fn fixed_now() -> OffsetDateTime {
        datetime!(2026-10-18 12:00 UTC)
    }

    fn run(shell: &mut Shell<MemoryStorage>, line: &str) -> String {
        let command = parse_line(line).expect("parse").expect("command");
        let mut out = Vec::new();
        shell.execute(command, &mut out).expect("execute");
        String::from_utf8(out).expect("utf8")
    }

    fn shell() -> Shell<MemoryStorage> {
        Shell::new(MemoryStorage::new(), StoreConfig::builtin()).with_fixed_time(fixed_now, 4)
    }

    #[test]
    fn rejected_changes_are_explained() {
        let mut shell = shell();
        let out = run(&mut shell, "sub deep 1");
        assert!(out.starts_with("not applied:"));
        let out = run(&mut shell, "set romantic 52");
        assert!(out.contains("deck: 52/52 cards (0 remaining)"));
        let out = run(&mut shell, "add playful 1");
        assert!(out.starts_with("not applied:"));
    }

    #[test]
    fn extreme_counts_are_rejected_not_fatal() {
        let mut shell = shell();
        run(&mut shell, "add deep 5");
        let out = run(&mut shell, "sub deep -9223372036854775808");
        assert!(out.starts_with("not applied:"));
        let out = run(&mut shell, "add deep 9223372036854775807");
        assert!(out.starts_with("not applied:"));
        let out = run(&mut shell, "sub deep 9223372036854775807");
        assert!(out.starts_with("not applied:"));
        assert!(run(&mut shell, "show").contains("deck: 5/52 cards"));
    }

    #[test]
    fn card_back_needs_a_full_deck() {
        let mut shell = shell();
        run(&mut shell, "set naughty 40");
        let out = run(&mut shell, "back pulse 90");
        assert!(out.contains("finish the deck first: 40 of 52"));

        run(&mut shell, "add friendship 12");
        let out = run(&mut shell, "back pulse 90");
        assert!(out.contains("card back: Pulse (hue 90)"));
        assert_eq!(run(&mut shell, "check"), "ready to order\n");
    }

    #[test]
    fn share_prints_message_and_link() {
        let mut shell = shell();
        assert!(run(&mut shell, "summary").contains("- Please select at least one category"));
        run(&mut shell, "set deep 52");
        run(&mut shell, "back origin 15");
        let out = run(&mut shell, "share 2");
        assert!(out.contains("Deck ID: DECK-MVDRWQO0-"));
        assert!(out.contains("Quantity: 2 decks"));
        assert!(out.contains("https://wa.me/2348165429119?text="));
    }

    #[test]
    fn quit_stops_the_loop() {
        let mut shell = shell();
        let mut out = Vec::new();
        let flow = shell.execute(Command::Quit, &mut out).expect("execute");
        assert_eq!(flow, Flow::Quit);
    }
}
