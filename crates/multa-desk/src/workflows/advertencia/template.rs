use chrono::NaiveDate;

use crate::workflows::intake::FieldMap;

/// Template store key for the Art. 267 written-warning request.
pub const ADVERTENCIA_TEMPLATE_KEY: &str = "advertencia_art_267";

const OPEN: &str = "{{";
const CLOSE: &str = "}}";

const FALLBACK_BODY: &str = "\
REQUERIMENTO DE CONVERSÃO DE MULTA EM ADVERTÊNCIA POR ESCRITO
REQUEST FOR CONVERSION OF A FINE INTO A WRITTEN WARNING (Art. 267, Brazilian Traffic Code)

À Autoridade de Trânsito competente

{{nome_condutor}}, inscrito(a) no CPF sob o nº {{cpf_condutor}}, vem, respeitosamente, \
requerer a conversão da penalidade de multa em advertência por escrito, nos termos do \
art. 267 do Código de Trânsito Brasileiro, referente ao Auto de Infração nº {{numero}}.

DADOS DA AUTUAÇÃO
Data da infração: {{data}}
Local: {{local}}
Placa do veículo: {{placa}}
Descrição: {{infracao}}
Código da infração: {{codigo_infracao}}

FUNDAMENTAÇÃO
Dispõe o art. 267 do CTB que deverá ser imposta a penalidade de advertência por escrito à \
infração de natureza leve ou média, passível de ser punida com multa, caso o infrator não \
tenha cometido nenhuma outra infração nos últimos doze meses. O(a) requerente preenche \
ambos os requisitos, conforme consulta ao seu prontuário.

PEDIDO
Diante do exposto, requer seja a penalidade de multa convertida em advertência por escrito, \
com o consequente arquivamento da cobrança.

Nestes termos, pede deferimento.
";

const FALLBACK_SIGNATURE: &str = "\
______________________________
Requerente

Destinatário: {{orgao_autuador}}
";

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TemplateError {
    #[error("placeholder opened at byte {offset} is never closed")]
    UnterminatedPlaceholder { offset: usize },
}

/// Substitutes every `{{key}}` with the field's text. Keys without a value
/// render as the empty string. Inserted values are not scanned again.
pub fn fill_template(template: &str, fields: &FieldMap) -> Result<String, TemplateError> {
    let mut output = String::with_capacity(template.len());
    let mut consumed = 0;

    for placeholder in scan(template) {
        let placeholder = placeholder?;
        output.push_str(&template[consumed..placeholder.start]);
        if let Some(value) = fields.get(placeholder.key) {
            output.push_str(value);
        }
        consumed = placeholder.end;
    }

    output.push_str(&template[consumed..]);
    Ok(output)
}

/// Placeholder keys in order of appearance.
pub fn placeholders(template: &str) -> Result<Vec<&str>, TemplateError> {
    scan(template)
        .map(|placeholder| placeholder.map(|found| found.key))
        .collect()
}

/// Built-in request used when no stored template exists. The issue date is
/// printed as `dd/mm/yyyy`.
pub fn fallback_template(today: NaiveDate) -> String {
    format!(
        "{FALLBACK_BODY}\n{}\n\n{FALLBACK_SIGNATURE}",
        format_br_date(today)
    )
}

pub fn format_br_date(date: NaiveDate) -> String {
    date.format("%d/%m/%Y").to_string()
}

struct Placeholder<'a> {
    start: usize,
    end: usize,
    key: &'a str,
}

fn scan(template: &str) -> impl Iterator<Item = Result<Placeholder<'_>, TemplateError>> {
    let mut cursor = 0;
    let mut failed = false;

    std::iter::from_fn(move || {
        if failed {
            return None;
        }
        let start = cursor + template[cursor..].find(OPEN)?;
        let key_start = start + OPEN.len();
        match template[key_start..].find(CLOSE) {
            Some(length) => {
                let end = key_start + length + CLOSE.len();
                cursor = end;
                Some(Ok(Placeholder {
                    start,
                    end,
                    key: template[key_start..key_start + length].trim(),
                }))
            }
            None => {
                failed = true;
                Some(Err(TemplateError::UnterminatedPlaceholder { offset: start }))
            }
        }
    })
}
