use crate::forms::{ApplicationForm, LOAN_TYPES};
use maud::{html, Markup};

pub fn application_form(values: &ApplicationForm, errors: &[String]) -> Markup {
    html! {
        form method="post" action="/applications" class="card" {
            @if !errors.is_empty() {
                ul class="errors" {
                    @for e in errors {
                        li { (e) }
                    }
                }
            }

            p {
                label for="applicant_name" { "Full name" } br;
                input type="text" id="applicant_name" name="applicant_name" value=(values.applicant_name) required;
            }
            p {
                label for="email" { "Email" } br;
                input type="email" id="email" name="email" value=(values.email) required;
            }
            p {
                label for="loan_type" { "Loan type" } br;
                select id="loan_type" name="loan_type" required {
                    option value="" disabled selected[values.loan_type.is_empty()] { "Select a loan type..." }
                    @for lt in LOAN_TYPES {
                        option value=(lt) selected[values.loan_type == lt] { (lt) }
                    }
                }
            }
            p {
                label for="amount" { "Amount" } br;
                input type="text" inputmode="numeric" id="amount" name="amount" value=(values.amount) required;
            }
            p {
                label for="term_months" { "Term (months, optional)" } br;
                input type="number" id="term_months" name="term_months" value=(values.term_months);
            }
            p {
                label for="purpose" { "Purpose (optional)" } br;
                textarea id="purpose" name="purpose" rows="3" { (values.purpose) }
            }
            button type="submit" { "Submit application" }
        }
    }
}
