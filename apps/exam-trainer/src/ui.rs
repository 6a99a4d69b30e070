//! UI rendering for exam trainer.

use crate::app::{App, CategoryPicker, InputField, MenuItem, PickerTarget, View};
use exam_core::study::OptionState;
use exam_core::{Category, Question};
use ratatui::{
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Gauge, List, ListItem, Paragraph, Row, Table, Wrap},
    Frame,
};

const LETTERS: [char; 6] = ['A', 'B', 'C', 'D', 'E', 'F'];

pub fn draw(f: &mut Frame, app: &mut App) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(3), Constraint::Min(0), Constraint::Length(3)])
        .split(f.area());

    draw_header(f, app, chunks[0]);
    match app.view {
        View::Home => draw_home(f, app, chunks[1]),
        View::Quiz => draw_quiz(f, app, chunks[1]),
        View::Results => draw_results(f, app, chunks[1]),
        View::Study => draw_study(f, app, chunks[1]),
        View::Flashcards => draw_flashcards(f, app, chunks[1]),
        View::Progress => draw_progress(f, app, chunks[1]),
    }
    draw_footer(f, app, chunks[2]);

    if app.show_help {
        draw_help(f);
    }

    if app.editing {
        draw_input(f, app);
    }

    if let Some(picker) = &app.picker {
        draw_picker(f, app, picker);
    }

    if let Some(msg) = &app.message {
        draw_message(f, msg);
    }
}

fn draw_header(f: &mut Frame, app: &App, area: Rect) {
    let title = match app.view {
        View::Home => "Examen civique",
        View::Quiz => "Exam simulation",
        View::Results => "Results",
        View::Study => "Study mode",
        View::Flashcards => "Flashcards",
        View::Progress => "Progress",
    };

    let mut spans = vec![Span::styled(title, Style::default().add_modifier(Modifier::BOLD))];
    if let (View::Quiz, Some(timer)) = (app.view, &app.timer) {
        let color = if timer.is_warning() { Color::Red } else { Color::Green };
        spans.push(Span::raw("  "));
        spans.push(Span::styled(
            timer.formatted(),
            Style::default().fg(color).add_modifier(Modifier::BOLD),
        ));
    }

    let header = Paragraph::new(Line::from(spans))
        .alignment(Alignment::Center)
        .block(Block::default().borders(Borders::ALL));
    f.render_widget(header, area);
}

fn draw_footer(f: &mut Frame, app: &App, area: Rect) {
    let help = match app.view {
        View::Home => "j/k:Navigate  Enter:Open  p:Progress  Backspace:Back  ?:Help  q:Quit",
        View::Quiz => "a-d/1-4:Answer  h/l:Prev/Next  g:Go to  f:Finish  Esc:Abandon",
        View::Results => "j/k:Scroll mistakes  r:New quiz  Enter/Esc:Home",
        View::Study => "Up/Down/1-4:Highlight  Enter/Right:Confirm/Next  Left:Prev  Esc:Exit",
        View::Flashcards => "Space:Flip  Left/Right:Navigate  1:Review  2:Known  Esc:Exit",
        View::Progress => "R:Reset quiz progress  F:Reset flashcards  Esc:Home",
    };

    let footer = Paragraph::new(help)
        .style(Style::default().fg(Color::DarkGray))
        .block(Block::default().borders(Borders::ALL));
    f.render_widget(footer, area);
}

fn draw_home(f: &mut Frame, app: &App, area: Rect) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(MenuItem::ALL.len() as u16 + 2), Constraint::Min(0)])
        .split(area);

    let items: Vec<ListItem> = MenuItem::ALL
        .iter()
        .enumerate()
        .map(|(i, item)| {
            let style = if i == app.selected_menu {
                Style::default().bg(Color::DarkGray).add_modifier(Modifier::BOLD)
            } else {
                Style::default()
            };
            ListItem::new(item.label()).style(style)
        })
        .collect();

    let menu = List::new(items).block(Block::default().borders(Borders::ALL).title(" Menu "));
    f.render_widget(menu, chunks[0]);

    let summary = if app.progress.has_progress() {
        let p = app.progress.progress();
        let mut lines = vec![
            Line::from(format!("Quizzes taken: {}", p.quizzes_taken)),
            Line::from(format!(
                "Best score: {}/{}",
                p.best_score,
                app.config.exam.total_questions()
            )),
        ];
        if let Some(avg) = app.progress.average_score() {
            lines.push(Line::from(format!("Average: {}%", avg)));
        }
        for weak in app.progress.weak_categories() {
            lines.push(Line::from(Span::styled(
                format!(
                    "Work on: {} ({}%)",
                    weak.category.label(),
                    weak.percentage.unwrap_or(0)
                ),
                Style::default().fg(Color::Yellow),
            )));
        }
        lines
    } else {
        vec![Line::from(Span::styled(
            "No quiz taken yet",
            Style::default().fg(Color::DarkGray),
        ))]
    };

    let stats = Paragraph::new(summary)
        .block(Block::default().borders(Borders::ALL).title(" Summary "))
        .wrap(Wrap { trim: true });
    f.render_widget(stats, chunks[1]);
}

fn question_lines(question: &Question) -> Vec<Line<'_>> {
    let mut lines = vec![Line::from(Span::styled(
        question.category.label(),
        Style::default().fg(Color::Cyan),
    ))];
    if question.is_situational {
        lines.push(Line::from(Span::styled(
            "Situation",
            Style::default().fg(Color::Magenta),
        )));
    }
    lines.push(Line::from(""));
    lines.push(Line::from(Span::styled(
        question.question.as_str(),
        Style::default().add_modifier(Modifier::BOLD),
    )));
    lines
}

fn option_line(index: usize, text: &str, style: Style) -> ListItem<'_> {
    let letter = LETTERS.get(index).copied().unwrap_or('?');
    ListItem::new(format!(" {}. {}", letter, text)).style(style)
}

fn draw_quiz(f: &mut Frame, app: &App, area: Rect) {
    let Some(question) = app.quiz.current_question() else {
        let msg = Paragraph::new("No quiz in progress")
            .alignment(Alignment::Center)
            .block(Block::default().borders(Borders::ALL));
        f.render_widget(msg, area);
        return;
    };

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(1), Constraint::Length(7), Constraint::Min(0)])
        .split(area);

    if let Some(timer) = &app.timer {
        let color = if timer.is_warning() { Color::Red } else { Color::Blue };
        let gauge = Gauge::default()
            .ratio(timer.percentage_remaining() / 100.0)
            .label(timer.formatted())
            .gauge_style(Style::default().fg(color));
        f.render_widget(gauge, chunks[0]);
    }

    let progress = app.quiz.progress();
    let title = format!(
        " Question {}/{} ({} answered) ",
        progress.current, progress.total, progress.answered
    );
    let text = Paragraph::new(question_lines(question))
        .block(Block::default().borders(Borders::ALL).title(title))
        .wrap(Wrap { trim: true });
    f.render_widget(text, chunks[1]);

    let selected = app.quiz.current_answer();
    let items: Vec<ListItem> = question
        .options
        .iter()
        .enumerate()
        .map(|(i, opt)| {
            let style = if selected == Some(i) {
                Style::default().fg(Color::Black).bg(Color::Yellow)
            } else {
                Style::default()
            };
            option_line(i, opt, style)
        })
        .collect();

    let list = List::new(items).block(Block::default().borders(Borders::ALL).title(" Answers "));
    f.render_widget(list, chunks[2]);
}

fn format_time(secs: u64) -> String {
    format!("{:02}:{:02}", secs / 60, secs % 60)
}

fn draw_results(f: &mut Frame, app: &App, area: Rect) {
    let Some(result) = app.quiz.result() else {
        return;
    };

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(5), Constraint::Length(9), Constraint::Min(0)])
        .split(area);

    let (verdict, color) = if result.passed {
        ("PASSED", Color::Green)
    } else {
        ("FAILED", Color::Red)
    };
    let summary = vec![
        Line::from(Span::styled(verdict, Style::default().fg(color).add_modifier(Modifier::BOLD))),
        Line::from(format!(
            "{}/{} ({}%)  -  {} correct needed",
            result.score,
            result.total,
            result.percentage(),
            app.config.exam.passing_score
        )),
        Line::from(format!("Time: {}", format_time(result.time_spent))),
    ];
    let header = Paragraph::new(summary)
        .alignment(Alignment::Center)
        .block(Block::default().borders(Borders::ALL).title(" Score "));
    f.render_widget(header, chunks[0]);

    let rows: Vec<Row> = result
        .category_scores
        .iter()
        .filter(|(_, s)| s.total > 0)
        .map(|(category, s)| {
            Row::new(vec![
                category.label().to_string(),
                format!("{}/{}", s.correct, s.total),
            ])
        })
        .collect();
    let table = Table::new(rows, [Constraint::Percentage(75), Constraint::Percentage(25)])
        .header(Row::new(vec!["Category", "Score"]).style(Style::default().add_modifier(Modifier::BOLD)))
        .block(Block::default().borders(Borders::ALL).title(" By category "));
    f.render_widget(table, chunks[1]);

    let mistakes: Vec<ListItem> = result
        .incorrect()
        .skip(app.results_scroll)
        .map(|detail| {
            let q = &detail.question;
            let yours = detail
                .user_answer
                .and_then(|i| q.options.get(i))
                .map(String::as_str)
                .unwrap_or("(no answer)");
            let mut lines = vec![
                Line::from(Span::styled(q.question.as_str(), Style::default().add_modifier(Modifier::BOLD))),
                Line::from(Span::styled(format!("  Your answer: {}", yours), Style::default().fg(Color::Red))),
                Line::from(Span::styled(
                    format!("  Correct: {}", q.correct_option().unwrap_or("")),
                    Style::default().fg(Color::Green),
                )),
            ];
            if let Some(explanation) = &q.explanation {
                lines.push(Line::from(Span::styled(
                    format!("  {}", explanation),
                    Style::default().fg(Color::DarkGray),
                )));
            }
            lines.push(Line::from(""));
            ListItem::new(lines)
        })
        .collect();

    let title = format!(" Mistakes ({}) ", result.incorrect().count());
    let list = List::new(mistakes).block(Block::default().borders(Borders::ALL).title(title));
    f.render_widget(list, chunks[2]);
}

fn draw_study(f: &mut Frame, app: &App, area: Rect) {
    let study = &app.study;
    let Some(question) = study.current_question() else {
        let msg = Paragraph::new("No questions to study")
            .alignment(Alignment::Center)
            .block(Block::default().borders(Borders::ALL));
        f.render_widget(msg, area);
        return;
    };

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(7), Constraint::Length(6), Constraint::Min(0)])
        .split(area);

    let title = format!(
        " Question {}/{}  |  {}/{} correct ",
        study.current_index() + 1,
        study.total_questions(),
        study.correct_count(),
        study.answered_count()
    );
    let text = Paragraph::new(question_lines(question))
        .block(Block::default().borders(Borders::ALL).title(title))
        .wrap(Wrap { trim: true });
    f.render_widget(text, chunks[0]);

    let items: Vec<ListItem> = question
        .options
        .iter()
        .enumerate()
        .map(|(i, opt)| {
            let style = match study.option_state(i) {
                OptionState::Neutral => Style::default(),
                OptionState::Highlighted => Style::default().fg(Color::Black).bg(Color::Yellow),
                OptionState::Correct => Style::default().fg(Color::Green).add_modifier(Modifier::BOLD),
                OptionState::Wrong => Style::default().fg(Color::Red).add_modifier(Modifier::CROSSED_OUT),
            };
            option_line(i, opt, style)
        })
        .collect();
    let list = List::new(items).block(Block::default().borders(Borders::ALL).title(" Answers "));
    f.render_widget(list, chunks[1]);

    if study.has_answered() {
        let mut lines = Vec::new();
        if let Some(explanation) = &question.explanation {
            lines.push(Line::from(explanation.as_str()));
        }
        for source in &question.sources {
            lines.push(Line::from(Span::styled(
                format!("{} <{}>", source.label, source.url),
                Style::default().fg(Color::DarkGray),
            )));
        }
        let explanation = Paragraph::new(lines)
            .block(Block::default().borders(Borders::ALL).title(" Explanation "))
            .wrap(Wrap { trim: true });
        f.render_widget(explanation, chunks[2]);
    }
}

fn draw_flashcards(f: &mut Frame, app: &App, area: Rect) {
    let deck = app.flashcards.deck();
    let stats = deck.deck_stats();

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(3), Constraint::Min(0)])
        .split(area);

    let filter = app
        .flashcards
        .current_filter()
        .map(|filter| filter.label())
        .unwrap_or("All cards");
    let status_line = Line::from(vec![
        Span::raw(format!("{}  ", filter)),
        Span::styled(format!("{} known", stats.known), Style::default().fg(Color::Green)),
        Span::raw(", "),
        Span::styled(format!("{} to review", stats.needs_review), Style::default().fg(Color::Yellow)),
        Span::raw(", "),
        Span::styled(format!("{} unseen", stats.unseen), Style::default().fg(Color::Blue)),
    ]);
    let status = Paragraph::new(status_line)
        .alignment(Alignment::Center)
        .block(Block::default().borders(Borders::ALL));
    f.render_widget(status, chunks[0]);

    let Some(card) = deck.current_card() else {
        let msg = Paragraph::new("No cards match this filter. Press Esc to go back.")
            .alignment(Alignment::Center)
            .block(Block::default().borders(Borders::ALL));
        f.render_widget(msg, chunks[1]);
        return;
    };

    let mut lines = question_lines(card);
    lines.push(Line::from(""));
    if deck.is_flipped() {
        lines.push(Line::from(Span::styled(
            card.correct_option().unwrap_or(""),
            Style::default().fg(Color::Green).add_modifier(Modifier::BOLD),
        )));
        if let Some(explanation) = &card.explanation {
            lines.push(Line::from(""));
            lines.push(Line::from(explanation.as_str()));
        }
        lines.push(Line::from(""));
        lines.push(Line::from(Span::styled(
            "1: Needs review   2: Known",
            Style::default().fg(Color::DarkGray),
        )));
    } else {
        lines.push(Line::from(Span::styled(
            "Press Space to reveal the answer",
            Style::default().fg(Color::DarkGray),
        )));
    }

    let status = deck
        .card_status(&card.id)
        .map(|s| s.name())
        .unwrap_or("Unseen");
    let nav = format!(
        "{}{}/{}{}",
        if app.flashcards.can_go_back() { "< " } else { "  " },
        deck.current_index() + 1,
        stats.total,
        if app.flashcards.can_go_forward() { " >" } else { "  " },
    );
    let card_view = Paragraph::new(lines)
        .alignment(Alignment::Center)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title(format!(" {} ", nav))
                .title_bottom(format!(" {} ", status)),
        )
        .wrap(Wrap { trim: true });
    f.render_widget(card_view, chunks[1]);
}

fn draw_progress(f: &mut Frame, app: &App, area: Rect) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(6), Constraint::Length(9), Constraint::Min(0)])
        .split(area);

    let p = app.progress.progress();
    let average = app
        .progress
        .average_score()
        .map(|a| format!("{}%", a))
        .unwrap_or_else(|| "-".to_string());
    let last = app
        .progress
        .last_quiz_formatted()
        .unwrap_or_else(|| "never".to_string());
    let summary = format!(
        "Quizzes taken: {}\nBest score: {}/{}\nAverage: {}\nLast quiz: {}",
        p.quizzes_taken,
        p.best_score,
        app.config.exam.total_questions(),
        average,
        last
    );
    let overview = Paragraph::new(summary)
        .block(Block::default().borders(Borders::ALL).title(" Quizzes "))
        .wrap(Wrap { trim: true });
    f.render_widget(overview, chunks[0]);

    let weak: Vec<Category> = app.progress.weak_categories().iter().map(|w| w.category).collect();
    let rows: Vec<Row> = app
        .progress
        .category_performance()
        .into_iter()
        .map(|perf| {
            let pct = perf
                .percentage
                .map(|p| format!("{}%", p))
                .unwrap_or_else(|| "-".to_string());
            let style = if weak.contains(&perf.category) {
                Style::default().fg(Color::Yellow)
            } else {
                Style::default()
            };
            Row::new(vec![
                perf.category.label().to_string(),
                format!("{}/{}", perf.correct, perf.attempts),
                pct,
            ])
            .style(style)
        })
        .collect();
    let table = Table::new(
        rows,
        [Constraint::Percentage(60), Constraint::Percentage(20), Constraint::Percentage(20)],
    )
    .header(Row::new(vec!["Category", "Correct", "Rate"]).style(Style::default().add_modifier(Modifier::BOLD)))
    .block(Block::default().borders(Borders::ALL).title(" By category "));
    f.render_widget(table, chunks[1]);

    let deck = app.flashcards.deck();
    let rows: Vec<Row> = Category::ALL
        .iter()
        .map(|&category| {
            let s = deck.category_stats(category);
            Row::new(vec![
                category.label().to_string(),
                s.known.to_string(),
                s.needs_review.to_string(),
                s.unseen.to_string(),
            ])
        })
        .collect();
    let global = deck.global_stats();
    let title = format!(
        " Flashcards: {}/{} known, {} reviewed ",
        global.known,
        global.total,
        deck.total_reviewed()
    );
    let table = Table::new(
        rows,
        [
            Constraint::Percentage(55),
            Constraint::Percentage(15),
            Constraint::Percentage(15),
            Constraint::Percentage(15),
        ],
    )
    .header(Row::new(vec!["Category", "Known", "Review", "Unseen"]).style(Style::default().add_modifier(Modifier::BOLD)))
    .block(Block::default().borders(Borders::ALL).title(title));
    f.render_widget(table, chunks[2]);
}

fn draw_help(f: &mut Frame) {
    let area = centered_rect(60, 80, f.area());
    f.render_widget(Clear, area);

    let help = r#"
Exam Trainer Keybindings

Quiz:
  a-d, 1-4        Choose an answer
  Up/Down         Cycle answers
  h/l, Left/Right Previous/next question
  g               Go to question number
  f               Finish and score
  Esc             Abandon quiz

Study:
  Up/Down, 1-4    Highlight an answer
  Enter, Right    Confirm, then next question
  Left            Previous question
  Esc             Exit

Flashcards:
  Space           Flip card
  Left/Right      Previous/next card
  1 / 2           Needs review / known (after flipping)
  Esc             Exit

General:
  Backspace       Back to previous session
  ?               Toggle help
  q               Quit
"#;

    let paragraph = Paragraph::new(help)
        .block(Block::default().borders(Borders::ALL).title(" Help "))
        .wrap(Wrap { trim: false });
    f.render_widget(paragraph, area);
}

fn draw_picker(f: &mut Frame, app: &App, picker: &CategoryPicker) {
    let area = centered_rect(60, 40, f.area());
    f.render_widget(Clear, area);

    let title = match picker.target {
        PickerTarget::Study => " Study a category ",
        PickerTarget::Flashcards => " Flashcards for a category ",
    };

    let items: Vec<ListItem> = Category::ALL
        .iter()
        .enumerate()
        .map(|(i, category)| {
            let count = app.bank.all().iter().filter(|q| q.category == *category).count();
            let style = if i == picker.selected {
                Style::default().bg(Color::DarkGray).add_modifier(Modifier::BOLD)
            } else {
                Style::default()
            };
            ListItem::new(format!("{} ({})", category.label(), count)).style(style)
        })
        .collect();

    let list = List::new(items).block(
        Block::default()
            .borders(Borders::ALL)
            .title(title)
            .title_bottom(" Enter:Start  Esc:Cancel "),
    );
    f.render_widget(list, area);
}

fn draw_input(f: &mut Frame, app: &App) {
    let area = centered_rect(50, 15, f.area());
    f.render_widget(Clear, area);

    let title = match app.input_field {
        InputField::GoToQuestion => format!("Go to question (1-{})", app.quiz.progress().total),
        InputField::None => String::new(),
    };

    let input = Paragraph::new(app.input_buffer.as_str())
        .style(Style::default().fg(Color::Yellow))
        .block(Block::default().borders(Borders::ALL).title(format!(" {} ", title)));
    f.render_widget(input, area);

    f.set_cursor_position((area.x + 1 + app.input_buffer.len() as u16, area.y + 1));
}

fn draw_message(f: &mut Frame, msg: &str) {
    let area = Rect::new(
        f.area().x + 2,
        f.area().height.saturating_sub(5),
        f.area().width.saturating_sub(4),
        3,
    );
    f.render_widget(Clear, area);

    let message = Paragraph::new(msg)
        .style(Style::default().fg(Color::Cyan))
        .alignment(Alignment::Center)
        .block(Block::default().borders(Borders::ALL));
    f.render_widget(message, area);
}

fn centered_rect(percent_x: u16, percent_y: u16, r: Rect) -> Rect {
    let popup_layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100 - percent_y) / 2),
            Constraint::Percentage(percent_y),
            Constraint::Percentage((100 - percent_y) / 2),
        ])
        .split(r);

    Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(popup_layout[1])[1]
}
