use std::sync::LazyLock;

use regex::Regex;

use crate::schemas::generation::{GenerationRequest, TaskType};

/// Upper bound on tasks requested from the model in one call.
pub(crate) const MAX_TASKS_PER_CALL: i64 = 3;
const DEFAULT_SOURCE_YEAR: &str = "2024";
const DEFAULT_SUBJECT: &str = "mechanika";
const DEFAULT_TOPIC: &str = "podstawy fizyki";

static SOURCE_YEAR_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b(20\d{2})\b").expect("valid regex"));

pub(crate) fn effective_task_count(requested: i64) -> i64 {
    requested.clamp(1, MAX_TASKS_PER_CALL)
}

/// First 20xx year mentioned in the retrieval context, used for the `source` field.
pub(crate) fn extract_source_year(context: &str) -> String {
    SOURCE_YEAR_RE
        .captures(context)
        .and_then(|captures| captures.get(1))
        .map(|year| year.as_str().to_string())
        .unwrap_or_else(|| DEFAULT_SOURCE_YEAR.to_string())
}

pub(crate) fn build(request: &GenerationRequest, context: &str) -> String {
    let params = PromptParams {
        count: effective_task_count(request.task_count),
        level: request.difficulty_level.trim(),
        subject: non_blank(request.physics_subject.as_deref()).unwrap_or(DEFAULT_SUBJECT),
        topic: non_blank(request.task_topic.as_deref()).unwrap_or(DEFAULT_TOPIC),
        year: extract_source_year(context),
        context,
    };

    match request.task_type {
        TaskType::Closed => closed_prompt(&params),
        TaskType::Open => open_prompt(&params),
    }
}

struct PromptParams<'a> {
    count: i64,
    level: &'a str,
    subject: &'a str,
    topic: &'a str,
    year: String,
    context: &'a str,
}

fn closed_prompt(p: &PromptParams<'_>) -> String {
    let PromptParams { count, level, subject, topic, year, context } = p;
    format!(
        r#"Wygeneruj {count} zadanie/zadania z fizyki jako JSON.

PARAMETRY:
Poziom: {level}
Dzial: {subject}
Temat: {topic}

KONTEKST - Przyklady z prawdziwych egzaminow:
{context}

PRZYKLAD JSON (DOKLADNIE TAKA STRUKTURA):
{{
  "tasks": [
    {{
      "content": "Samochod przejezdza 120 km w czasie 2 godzin. Oblicz predkosc srednia pojazdu.",
      "answers": ["A) 30 km/h", "B) 60 km/h", "C) 90 km/h", "D) 120 km/h"],
      "correctAnswer": "B",
      "solution": "Predkosc srednia v = droga/czas = 120 km / 2 h = 60 km/h. Odpowiedz: B",
      "source": "Matura {year} CKE"
    }}
  ]
}}

KLUCZOWE ZASADY:
1. Wygeneruj DOKLADNIE {count} zadanie/zadania
2. Bez polskich znakow (a,c,e,l,n,o,s,z zamiast ą,ć,ę,ł,ń,ó,ś,ź)
3. Kazde zadanie w osobnym obiekcie
4. 4 odpowiedzi A,B,C,D
5. W polu "source" OBOWIAZKOWO uzyj formatu: "Matura {year} CKE"
6. Jesli w kontekscie jest inny rok niz {year}, uzyj tego roku!
7. Zamknij wszystkie nawiasy }}]}}
8. Zwroc TYLKO JSON bez zadnych dodatkowych tekstow, bez ``` i bez preamble

Wygeneruj teraz JSON:"#
    )
}

fn open_prompt(p: &PromptParams<'_>) -> String {
    let PromptParams { count, level, subject, topic, year, context } = p;
    format!(
        r#"Wygeneruj {count} otwarte zadanie/zadania obliczeniowe z fizyki jako JSON.

PARAMETRY:
Poziom: {level}
Dzial: {subject}
Temat: {topic}

KONTEKST - Przyklady z prawdziwych egzaminow:
{context}

PRZYKLAD JSON (DOKLADNIE TAKA STRUKTURA):
{{
  "tasks": [
    {{
      "content": "Cialo o masie 2 kg porusza sie z przyspieszeniem 3 m/s^2. Oblicz wartosc sily wypadkowej.",
      "answers": null,
      "correctAnswer": "6 N",
      "solution": "Dane: m = 2 kg, a = 3 m/s^2\nWzor: F = m * a\nObliczenia: F = 2 kg * 3 m/s^2 = 6 N\nOdpowiedz: 6 N",
      "source": "Matura {year} CKE",
      "pointsAvailable": 2
    }}
  ]
}}

KLUCZOWE ZASADY:
1. Wygeneruj DOKLADNIE {count} zadanie/zadania
2. Bez polskich znakow (a,c,e,l,n,o,s,z zamiast ą,ć,ę,ł,ń,ó,ś,ź)
3. Pole "answers" ZAWSZE null
4. "correctAnswer" to sama wartosc liczbowa z jednostka, np. "6 N"
5. "solution" MUSI zawierac sekcje: Dane, Wzor, Obliczenia, Odpowiedz
6. "pointsAvailable" to liczba calkowita od 1 do 3
7. W polu "source" OBOWIAZKOWO uzyj formatu: "Matura {year} CKE"
8. Zamknij wszystkie nawiasy }}]}}
9. Zwroc TYLKO JSON bez zadnych dodatkowych tekstow, bez ``` i bez preamble

Wygeneruj teraz JSON:"#
    )
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|value| !value.is_empty())
}
