//! Terminal front-end. Renders flow states to stdout and turns stdin lines
//! into controller intents.

use std::fmt::Write as _;

use tokio::io::{AsyncBufReadExt, BufReader};

use crate::api::types::medal_for_rank;
use crate::quiz::{FlowState, QuestionKind, QuizController, QuizResult, RecoveryAction};

const SUBMITTING_NOTICE: &str =
    "⏳ Analisando suas preferências com IA...\n   Isso pode levar alguns segundos\n";

/// A user intent typed at the prompt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Pick the option with this 1-based number.
    Select(usize),
    /// Free text for the current question.
    Text(String),
    Next,
    Prev,
    Submit,
    /// Restart after a result, or recover after a failure.
    Again,
    Quit,
    /// Empty line: just show the current state again.
    Redraw,
}

impl Command {
    /// Parse a line in the context of the current state.
    ///
    /// On a free-text question anything that is not a navigation keyword is
    /// taken as the answer.
    pub fn parse(line: &str, state: &FlowState) -> Option<Self> {
        let line = line.trim();
        match line.to_lowercase().as_str() {
            "" => return Some(Self::Redraw),
            "q" | "quit" | "sair" => return Some(Self::Quit),
            "n" | "next" | "proxima" => return Some(Self::Next),
            "p" | "prev" | "anterior" => return Some(Self::Prev),
            "s" | "submit" | "enviar" => return Some(Self::Submit),
            "r" | "retry" | "restart" | "refazer" => return Some(Self::Again),
            _ => {}
        }

        let kind = state
            .as_active()
            .and_then(|quiz| quiz.current_question())
            .map(|q| q.kind);
        match kind {
            Some(QuestionKind::FreeText) => Some(Self::Text(line.to_string())),
            Some(_) => line.parse::<usize>().ok().filter(|n| *n > 0).map(Self::Select),
            None => None,
        }
    }
}

/// Render a state as plain text.
pub fn render(state: &FlowState) -> String {
    let mut out = String::new();
    match state {
        FlowState::Loading => out.push_str("⏳ Carregando quiz...\n"),
        FlowState::Submitting { .. } => out.push_str(SUBMITTING_NOTICE),
        FlowState::Failed { message, recovery } => {
            let _ = writeln!(out, "❌ {message}");
            let hint = match recovery {
                RecoveryAction::ReloadQuestions => "tentar carregar novamente",
                RecoveryAction::ResumeQuiz { .. } => "voltar ao quiz",
            };
            let _ = writeln!(out, "   [r] {hint}  [q] sair");
        }
        FlowState::Result { result, .. } => render_result(&mut out, result),
        FlowState::Active(quiz) => {
            let progress = quiz.progress();
            let _ = writeln!(
                out,
                "Pergunta {} de {} ({}% concluído)",
                progress.step, progress.total, progress.percent
            );

            match quiz.current_question() {
                None => out.push_str("\nNenhuma pergunta disponível.\n"),
                Some(question) => {
                    let _ = writeln!(out, "\n{}", question.prompt);
                    if let Some(desc) = &question.description {
                        let _ = writeln!(out, "  {desc}");
                    }
                    if question.kind == QuestionKind::MultiChoice {
                        out.push_str("  Selecione uma ou mais opções\n");
                    }

                    let answer = quiz.answers.get(&question.id);
                    for (i, option) in question.options.iter().enumerate() {
                        let mark = if answer.is_some_and(|a| a.is_selected(&option.value)) {
                            "x"
                        } else {
                            " "
                        };
                        let icon = option.icon.as_deref().map(|e| format!("{e} ")).unwrap_or_default();
                        let _ = write!(out, "  [{mark}] {}. {icon}{}", i + 1, option.label);
                        match &option.description {
                            Some(desc) => {
                                let _ = writeln!(out, " — {desc}");
                            }
                            None => out.push('\n'),
                        }
                    }
                    if question.kind == QuestionKind::FreeText {
                        let current = answer.and_then(|a| a.as_str()).unwrap_or("");
                        let _ = writeln!(out, "  Digite aqui... (atual: \"{current}\")");
                    }
                }
            }

            let mut actions = Vec::new();
            if !quiz.is_first_question() {
                actions.push("[p] anterior");
            }
            if quiz.is_last_question() {
                actions.push("[s] descobrir perfumes");
            } else {
                actions.push("[n] próxima");
            }
            actions.push("[q] sair");
            let _ = writeln!(out, "\n{}", actions.join("  "));
            if !quiz.can_advance() {
                out.push_str("(resposta obrigatória)\n");
            }
        }
    }
    out
}

fn render_result(out: &mut String, result: &QuizResult) {
    let _ = writeln!(out, "🎉 Seus Perfumes Ideais!");
    if !result.message.is_empty() {
        let _ = writeln!(out, "{}", result.message);
    }
    let _ = writeln!(out, "\n📋 Seu Perfil Olfativo\n{}", result.profile);

    for (rank, perfume) in result.ranked() {
        let _ = writeln!(
            out,
            "\n{} #{rank} {} ({}) — {}%",
            medal_for_rank(rank),
            perfume.nome,
            perfume.categoria,
            perfume.match_score
        );
        if let Some(pix) = &perfume.preco_pix {
            let _ = writeln!(out, "   {pix} no pix");
        }
        if perfume.shows_regular_price() {
            if let Some(preco) = &perfume.preco {
                let _ = writeln!(out, "   ou {preco}");
            }
        }
        let _ = writeln!(out, "   Por que combina com você: {}", perfume.motivo_recomendacao);
        if perfume.has_notes() {
            for (label, notes) in [
                ("Topo", &perfume.notas_topo),
                ("Coração", &perfume.notas_coracao),
                ("Fundo", &perfume.notas_fundo),
            ] {
                if let Some(notes) = notes {
                    let _ = writeln!(out, "   {label}: {notes}");
                }
            }
        }
        if let Some(link) = &perfume.link_produto {
            let _ = writeln!(out, "   {link}");
        }
    }

    if let Some(tip) = &result.extra_tip {
        let _ = writeln!(out, "\n💡 Dica: {tip}");
    }
    out.push_str("\n[r] refazer quiz  [q] sair\n");
}

/// Apply one command. Returns `false` when the user asked to quit.
pub async fn apply(controller: &mut QuizController, command: Command) -> bool {
    let outcome = match command {
        Command::Quit => return false,
        Command::Redraw => Ok(()),
        Command::Select(n) => {
            let value = controller
                .state()
                .as_active()
                .and_then(|quiz| quiz.current_question())
                .and_then(|q| n.checked_sub(1).and_then(|i| q.options.get(i)))
                .map(|o| o.value.clone());
            match value {
                Some(value) => controller.select_option(&value),
                None => {
                    eprintln!("Opção inválida: {n}");
                    Ok(())
                }
            }
        }
        Command::Text(text) => controller.enter_text(&text),
        Command::Next => controller.advance().map(|_| ()),
        Command::Prev => controller.retreat().map(|_| ()),
        Command::Submit => {
            let ready = controller
                .state()
                .as_active()
                .is_some_and(|quiz| quiz.is_last_question() && quiz.can_advance());
            if ready {
                eprint!("{SUBMITTING_NOTICE}");
            }
            controller.submit().await
        }
        Command::Again => {
            if matches!(controller.state(), FlowState::Result { .. }) {
                controller.restart()
            } else {
                controller.recover().await
            }
        }
    };
    report(outcome)
}

fn report(outcome: Result<(), crate::error::FlowError>) -> bool {
    if let Err(e) = outcome {
        tracing::debug!("Intent refused: {}", e);
        eprintln!("⚠️  {e}");
    }
    true
}

/// Run the read-render loop on stdin/stdout until EOF or quit.
pub async fn run(controller: &mut QuizController) {
    let stdin = tokio::io::stdin();
    let reader = BufReader::new(stdin);
    let mut lines = reader.lines();

    println!("{}", render(controller.state()));
    eprint!("> ");

    loop {
        match lines.next_line().await {
            Ok(Some(line)) => {
                let Some(command) = Command::parse(&line, controller.state()) else {
                    eprintln!("Comando não reconhecido: {}", line.trim());
                    eprint!("> ");
                    continue;
                };
                if !apply(controller, command).await {
                    break;
                }
                println!("\n{}", render(controller.state()));
                eprint!("> ");
            }
            Ok(None) => break, // EOF
            Err(e) => {
                tracing::error!("Error reading stdin: {}", e);
                break;
            }
        }
    }
}
